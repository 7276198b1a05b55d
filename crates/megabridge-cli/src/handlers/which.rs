//! Which command handler.
//!
//! Shows the executable bootstrap resolved, for debugging `PATH` and
//! `MEGATOOLS_PATH` issues.

use megabridge_runtime::Megatools;

pub fn execute(megatools: &Megatools) {
    println!("{}", megatools.executable().display());
}
