//! Configure and build command construction.
//!
//! Commands carry their own environment map. Nothing here touches the
//! orchestrator's process environment; the launcher variables reach the
//! external tool only through the child it is spawned as.

use crate::models::{BuildLayout, BuildSettings, LayoutConfig};
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fmt;

/// Variable the external tool reads for the C compiler launcher.
pub const C_LAUNCHER_VAR: &str = "CMAKE_C_COMPILER_LAUNCHER";
/// Variable the external tool reads for the C++ compiler launcher.
pub const CXX_LAUNCHER_VAR: &str = "CMAKE_CXX_COMPILER_LAUNCHER";

/// An external command plus the variables set for that child only.
///
/// Arguments are OS strings so paths that are not valid UTF-8 reach the
/// child byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<OsString>,
    pub env: BTreeMap<String, String>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        ShellCommand {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs(mut self, vars: BTreeMap<String, String>) -> Self {
        self.env.extend(vars);
        self
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Printable form of the shell line, lossy for non-UTF-8 arguments.
    pub fn render(&self) -> String {
        std::iter::once(shell_quote(&self.program))
            .chain(self.args.iter().map(|arg| shell_quote(&arg.to_string_lossy())))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The exact shell line handed to `sh -c`.
    pub fn shell_line(&self) -> OsString {
        let mut line = shell_quote_os(OsStr::new(&self.program));
        for arg in &self.args {
            line.push(" ");
            line.push(shell_quote_os(arg));
        }
        line
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Quote a word for a POSIX shell, leaving plain words untouched.
pub fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-+=./:,@%".contains(c));

    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// [`shell_quote`] over raw OS bytes.
#[cfg(unix)]
pub fn shell_quote_os(word: &OsStr) -> OsString {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    let bytes = word.as_bytes();
    let plain = !bytes.is_empty()
        && bytes
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || b"_-+=./:,@%".contains(b));
    if plain {
        return word.to_os_string();
    }

    let mut quoted = Vec::with_capacity(bytes.len() + 2);
    quoted.push(b'\'');
    for &b in bytes {
        if b == b'\'' {
            quoted.extend_from_slice(b"'\\''");
        } else {
            quoted.push(b);
        }
    }
    quoted.push(b'\'');
    OsString::from_vec(quoted)
}

#[cfg(not(unix))]
pub fn shell_quote_os(word: &OsStr) -> OsString {
    OsString::from(shell_quote(&word.to_string_lossy()))
}

/// `-D<name>=<value>` with the value kept as raw OS bytes.
fn define(name: &str, value: &OsStr) -> OsString {
    let mut arg = OsString::from(format!("-D{}=", name));
    arg.push(value);
    arg
}

/// Launcher variables for the child processes; empty when ccache is off.
pub fn launcher_env(settings: &BuildSettings, config: &LayoutConfig) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    if settings.use_ccache {
        vars.insert(C_LAUNCHER_VAR.to_string(), config.compiler_launcher.clone());
        vars.insert(CXX_LAUNCHER_VAR.to_string(), config.compiler_launcher.clone());
    }
    vars
}

/// `cmake -G <generator> -D... <source>`, plus launcher definitions when enabled.
pub fn configure_command(
    settings: &BuildSettings,
    layout: &BuildLayout,
    config: &LayoutConfig,
) -> ShellCommand {
    let mut command = ShellCommand::new("cmake")
        .arg("-G")
        .arg(config.generator.clone())
        .arg(define("INSTALL_ROOT", layout.install_dir.as_os_str()))
        .arg(define(
            "EXTERNALS_DOWNLOAD_DIR",
            layout.deps_cache_dir.as_os_str(),
        ))
        .arg(format!("-DCMAKE_BUILD_TYPE={}", settings.build_type))
        .arg(layout.source_dir.as_os_str());

    if settings.use_ccache {
        command = command
            .arg(format!("-D{}={}", C_LAUNCHER_VAR, config.compiler_launcher))
            .arg(format!("-D{}={}", CXX_LAUNCHER_VAR, config.compiler_launcher));
    }

    // External projects configured at this step read the launcher from the
    // environment rather than from the cache.
    command.envs(launcher_env(settings, config))
}

/// `cmake --build . --target all --parallel <jobs>`.
pub fn build_command(jobs: usize, settings: &BuildSettings, config: &LayoutConfig) -> ShellCommand {
    ShellCommand::new("cmake")
        .arg("--build")
        .arg(".")
        .arg("--target")
        .arg("all")
        .arg("--parallel")
        .arg(jobs.to_string())
        .envs(launcher_env(settings, config))
}
