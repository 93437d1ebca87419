//! Uploader argument vector construction and quoting.
//!
//! The vector never carries the upload token: command lines are visible to
//! every process on the host, so the token travels in the environment.

use std::path::PathBuf;

use crate::config::non_blank;
use crate::source::UploadSource;

pub const UPLOAD_SUBCOMMAND: &str = "upload-process";

/// Options forwarded verbatim to the uploader, each under a fixed flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub build_url:      Option<String>,
    pub job_code:       Option<String>,
    pub name:           Option<String>,
    pub branch:         Option<String>,
    pub sha:            Option<String>,
    pub pr:             Option<String>,
    pub slug:           Option<String>,
    pub build:          Option<String>,
    pub git_service:    Option<String>,
    pub plugins:        Vec<String>,
    pub flags:          Vec<String>,
    pub env_vars:       Vec<String>,
    pub dry_run:        bool,
    pub fail_on_error:  bool,
    pub disable_search: bool,
}

/// A fully resolved uploader invocation, minus the program path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    pub verbose:             bool,
    pub source:              UploadSource,
    pub network_root_folder: Option<PathBuf>,
    pub options:             UploadOptions,
}

/// Build the uploader's argument vector.
///
/// Global flags come first, then the subcommand, the source selection, the
/// network root folder and the pass-through options.
///
/// ```
/// use std::path::PathBuf;
/// use covup::args::{UploadConfig, UploadOptions, build_upload_arguments};
/// use covup::source::UploadSource;
///
/// let config = UploadConfig {
///     verbose:             true,
///     source:              UploadSource::SearchRoot(PathBuf::from("/build/testResults")),
///     network_root_folder: None,
///     options:             UploadOptions::default(),
/// };
/// assert_eq!(
///     build_upload_arguments(&config),
///     ["-v", "upload-process", "--dir", "/build/testResults"]
/// );
/// ```
pub fn build_upload_arguments(config: &UploadConfig) -> Vec<String> {
    let mut args = Vec::new();
    if config.verbose {
        args.push("-v".to_string());
    }
    args.push(UPLOAD_SUBCOMMAND.to_string());

    match &config.source {
        UploadSource::DirectFile(path) => push_pair(&mut args, "--file", path.display().to_string()),
        UploadSource::SearchRoot(path) => push_pair(&mut args, "--dir", path.display().to_string()),
    }
    if let Some(folder) = &config.network_root_folder {
        push_pair(&mut args, "--network-root-folder", folder.display().to_string());
    }

    let opts = &config.options;
    let single = [
        ("--build-url", &opts.build_url),
        ("--job-code", &opts.job_code),
        ("--name", &opts.name),
        ("--branch", &opts.branch),
        ("--sha", &opts.sha),
        ("--pr", &opts.pr),
        ("--slug", &opts.slug),
        ("--build", &opts.build),
        ("--git-service", &opts.git_service),
    ];
    for (flag, value) in single {
        if let Some(value) = non_blank(value.as_deref()) {
            push_pair(&mut args, flag, value.to_string());
        }
    }

    let repeated = [
        ("--plugin", &opts.plugins),
        ("--flag", &opts.flags),
        ("--env-var", &opts.env_vars),
    ];
    for (flag, values) in repeated {
        for value in values.iter().filter_map(|v| non_blank(Some(v.as_str()))) {
            push_pair(&mut args, flag, value.to_string());
        }
    }

    let switches = [
        ("--dry-run", opts.dry_run),
        ("--fail-on-error", opts.fail_on_error),
        ("--disable-search", opts.disable_search),
    ];
    args.extend(switches.into_iter().filter(|(_, on)| *on).map(|(flag, _)| flag.to_string()));

    args
}

fn push_pair(args: &mut Vec<String>, flag: &str, value: String) {
    args.push(flag.to_string());
    args.push(value);
}

/// Wrap `arg` in double quotes, escaping backslashes and quotes.
///
/// ```
/// use covup::args::quote_argument;
///
/// assert_eq!(quote_argument(r#"C:\path "x""#), r#""C:\\path \"x\"""#);
/// assert_eq!(quote_argument(""), r#""""#);
/// ```
pub fn quote_argument(arg: &str) -> String {
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if matches!(c, '\\' | '"') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Inverse of [`quote_argument`]. Input that is not wrapped in double quotes
/// is returned unchanged.
pub fn unquote_argument(arg: &str) -> String {
    let Some(inner) = arg
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return arg.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Render a command line for logs, every part quoted.
pub fn render_command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(quote_argument)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(source: UploadSource) -> UploadConfig {
        UploadConfig {
            verbose: false,
            source,
            network_root_folder: None,
            options: UploadOptions::default(),
        }
    }

    #[test]
    fn test_search_root_uses_dir_flag() {
        let args = build_upload_arguments(&config(UploadSource::SearchRoot(PathBuf::from(
            "/agent/_work/1/s/testResults",
        ))));
        assert_eq!(args, ["upload-process", "--dir", "/agent/_work/1/s/testResults"]);
        assert!(!args.iter().any(|a| a == "--file"));
    }

    #[test]
    fn test_direct_file_uses_file_flag() {
        let args = build_upload_arguments(&config(UploadSource::DirectFile(PathBuf::from(
            "/src/coverage.xml",
        ))));
        assert_eq!(args, ["upload-process", "--file", "/src/coverage.xml"]);
    }

    #[test]
    fn test_full_ordering() {
        let cfg = UploadConfig {
            verbose:             true,
            source:              UploadSource::DirectFile(PathBuf::from("/src/lcov.info")),
            network_root_folder: Some(PathBuf::from("/src")),
            options:             UploadOptions {
                build_url:      Some("https://ci.example/build/7".into()),
                job_code:       Some("job-1".into()),
                name:           Some("unit tests".into()),
                branch:         Some("main".into()),
                sha:            Some("deadbeef".into()),
                pr:             Some("42".into()),
                slug:           Some("org/repo".into()),
                build:          Some("7".into()),
                git_service:    Some("github".into()),
                plugins:        vec!["xcode".into(), "gcov".into()],
                flags:          vec!["unit".into(), " ".into(), "linux".into()],
                env_vars:       vec!["OS".into()],
                dry_run:        true,
                fail_on_error:  true,
                disable_search: true,
            },
        };
        assert_eq!(build_upload_arguments(&cfg), [
            "-v",
            "upload-process",
            "--file",
            "/src/lcov.info",
            "--network-root-folder",
            "/src",
            "--build-url",
            "https://ci.example/build/7",
            "--job-code",
            "job-1",
            "--name",
            "unit tests",
            "--branch",
            "main",
            "--sha",
            "deadbeef",
            "--pr",
            "42",
            "--slug",
            "org/repo",
            "--build",
            "7",
            "--git-service",
            "github",
            "--plugin",
            "xcode",
            "--plugin",
            "gcov",
            "--flag",
            "unit",
            "--flag",
            "linux",
            "--env-var",
            "OS",
            "--dry-run",
            "--fail-on-error",
            "--disable-search",
        ]);
    }

    #[test]
    fn test_blank_options_are_skipped() {
        let mut cfg = config(UploadSource::SearchRoot(PathBuf::from("/r")));
        cfg.options.branch = Some("   ".into());
        cfg.options.sha = Some(String::new());
        assert_eq!(build_upload_arguments(&cfg), ["upload-process", "--dir", "/r"]);
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote_argument("plain"), "\"plain\"");
        assert_eq!(quote_argument("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote_argument("a\\b"), "\"a\\\\b\"");
        assert_eq!(quote_argument(""), "\"\"");
    }

    #[test]
    fn test_quote_unquote_is_stable() {
        for s in ["", "plain", "with space", "q\"uote", "back\\slash", "\\\"", "trailing\\", "\"\""] {
            let quoted = quote_argument(s);
            assert_eq!(unquote_argument(&quoted), s);
            assert_eq!(quote_argument(&unquote_argument(&quoted)), quoted);
        }
    }

    #[test]
    fn test_unquote_passes_bare_input_through() {
        assert_eq!(unquote_argument("bare"), "bare");
        assert_eq!(unquote_argument("\""), "\"");
    }

    #[test]
    fn test_render_command_line() {
        let line = render_command_line("/tmp/codecov", &["-v".into(), "upload-process".into()]);
        assert_eq!(line, "\"/tmp/codecov\" \"-v\" \"upload-process\"");
    }
}
