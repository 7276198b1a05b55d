//! Typed `megatools dl` options.
//!
//! Each field maps to exactly one command-line flag. Anything megatools
//! supports that is not modelled here can be passed through
//! [`DownloadOptions::with_extra`].

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

/// Which IP protocol megatools should prefer when connecting to mega.nz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpProto {
    V4,
    V6,
    Any,
}

impl IpProto {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V4 => "v4",
            Self::V6 => "v6",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for IpProto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for a `megatools dl` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadOptions {
    /// Local directory or file name to save data to.
    pub path: Option<PathBuf>,
    /// Account username (email).
    pub username: Option<String>,
    /// Account password.
    pub password: Option<String>,
    /// Transfer speed limit in KiB/s.
    pub limit_speed: Option<u64>,
    /// Proxy setup string.
    pub proxy: Option<String>,
    /// Network interface or local IP address for outgoing connections.
    pub netif: Option<String>,
    pub ip_proto: Option<IpProto>,
    /// Load configuration from this file instead of `mega.ini`.
    pub config: Option<PathBuf>,
    /// megatools debug categories (e.g. `http,api`).
    pub debug: Option<String>,
    pub no_progress: bool,
    pub print_names: bool,
    pub disable_resume: bool,
    /// Reload the filesystem cache.
    pub reload: bool,
    pub ignore_config_file: bool,
    /// Pass-through options as `(name, value)`; a `None` value is a bare switch.
    pub extra: Vec<(String, Option<String>)>,
}

impl DownloadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub const fn with_limit_speed(mut self, kib_per_sec: u64) -> Self {
        self.limit_speed = Some(kib_per_sec);
        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    #[must_use]
    pub const fn with_ip_proto(mut self, proto: IpProto) -> Self {
        self.ip_proto = Some(proto);
        self
    }

    #[must_use]
    pub const fn with_no_progress(mut self, no_progress: bool) -> Self {
        self.no_progress = no_progress;
        self
    }

    #[must_use]
    pub const fn with_print_names(mut self, print_names: bool) -> Self {
        self.print_names = print_names;
        self
    }

    #[must_use]
    pub const fn with_disable_resume(mut self, disable_resume: bool) -> Self {
        self.disable_resume = disable_resume;
        self
    }

    /// Add a pass-through option. Underscores in `name` become hyphens.
    #[must_use]
    pub fn with_extra(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.extra.push((name.into(), value));
        self
    }

    /// Render the options as command-line arguments.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args = Vec::new();

        if let Some(path) = &self.path {
            args.push(flag_with_value("path", path.as_os_str()));
        }
        if let Some(username) = &self.username {
            args.push(flag_with_value("username", username.as_ref()));
        }
        if let Some(password) = &self.password {
            args.push(flag_with_value("password", password.as_ref()));
        }
        if let Some(limit) = self.limit_speed {
            args.push(flag_with_value("limit-speed", limit.to_string().as_ref()));
        }
        if let Some(proxy) = &self.proxy {
            args.push(flag_with_value("proxy", proxy.as_ref()));
        }
        if let Some(netif) = &self.netif {
            args.push(flag_with_value("netif", netif.as_ref()));
        }
        if let Some(proto) = self.ip_proto {
            args.push(flag_with_value("ip-proto", proto.as_str().as_ref()));
        }
        if let Some(config) = &self.config {
            args.push(flag_with_value("config", config.as_os_str()));
        }
        if let Some(debug) = &self.debug {
            args.push(flag_with_value("debug", debug.as_ref()));
        }

        let switches = [
            (self.no_progress, "--no-progress"),
            (self.print_names, "--print-names"),
            (self.disable_resume, "--disable-resume"),
            (self.reload, "--reload"),
            (self.ignore_config_file, "--ignore-config-file"),
        ];
        args.extend(
            switches
                .into_iter()
                .filter(|(enabled, _)| *enabled)
                .map(|(_, flag)| OsString::from(flag)),
        );

        for (name, value) in &self.extra {
            let name = name.replace('_', "-");
            match value {
                Some(value) => args.push(flag_with_value(&name, value.as_ref())),
                None => args.push(OsString::from(format!("--{name}"))),
            }
        }

        args
    }
}

fn flag_with_value(name: &str, value: &std::ffi::OsStr) -> OsString {
    let mut arg = OsString::from(format!("--{name}="));
    arg.push(value);
    arg
}
