//! Task inputs, endpoints and run settings.
//!
//! Every input can be given as a flag or through the `INPUT_<NAME>`
//! variable a pipeline task host exports for it.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use covup_fetch::data::DEFAULT_TIMEOUT;
use covup_platform::UploaderPlatform;

use crate::args::UploadOptions;
use crate::error::Result;
use crate::token::TokenInputs;

/// Environment variable the uploader reads its token from.
pub const TOKEN_VARIABLE: &str = "CODECOV_TOKEN";

pub const DEFAULT_KEYS_URL: &str = "https://keybase.io/codecovsecurity/pgp_keys.asc";
pub const DEFAULT_CLI_BASE_URL: &str = "https://cli.codecov.io";
pub const DEFAULT_VERSION: &str = "latest";

pub const MANIFEST_SUFFIX: &str = ".SHA256SUM";
pub const SIGNATURE_SUFFIX: &str = ".SHA256SUM.sig";
pub const KEYS_FILE_NAME: &str = "pgp_keys.asc";

#[derive(Clone, Debug, Parser)]
#[command(name = "covup", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct TaskInputs {
    /// Upload token; takes precedence over every other source.
    ///
    /// Pass it through `INPUT_TOKEN`. The flag is hidden because anything on
    /// the command line shows up in process listings.
    #[arg(long, env = "INPUT_TOKEN", hide = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Token set as a pipeline variable, read from `PIPELINE_CODECOV_TOKEN`.
    #[arg(long, env = "PIPELINE_CODECOV_TOKEN", hide = true, hide_env_values = true)]
    pub pipeline_token: Option<String>,

    /// Upload exactly this coverage report.
    #[arg(long = "coverage-file", env = "INPUT_COVERAGEFILENAME")]
    pub coverage_file_name: Option<String>,

    /// Folder searched for coverage reports (and base for a relative --coverage-file).
    #[arg(long = "results-folder", env = "INPUT_TESTRESULTFOLDERNAME")]
    pub test_result_folder_name: Option<String>,

    #[arg(short, long, env = "INPUT_VERBOSE")]
    pub verbose: bool,

    #[arg(long, env = "INPUT_NETWORKROOTFOLDER")]
    pub network_root_folder: Option<String>,

    #[arg(long, env = "INPUT_BUILDURL")]
    pub build_url: Option<String>,

    #[arg(long, env = "INPUT_JOBCODE")]
    pub job_code: Option<String>,

    #[arg(long, env = "INPUT_NAME")]
    pub name: Option<String>,

    #[arg(long, env = "INPUT_BRANCH")]
    pub branch: Option<String>,

    #[arg(long, env = "INPUT_SHA")]
    pub sha: Option<String>,

    #[arg(long, env = "INPUT_PR")]
    pub pr: Option<String>,

    #[arg(long, env = "INPUT_SLUG")]
    pub slug: Option<String>,

    /// Build code passed as `--build`.
    #[arg(long, env = "INPUT_BUILD")]
    pub build: Option<String>,

    #[arg(long, env = "INPUT_GITSERVICE")]
    pub git_service: Option<String>,

    #[arg(long = "plugin", env = "INPUT_PLUGINS", value_delimiter = ',')]
    pub plugins: Vec<String>,

    #[arg(long = "flag", env = "INPUT_FLAGS", value_delimiter = ',')]
    pub flags: Vec<String>,

    #[arg(long = "env-var", env = "INPUT_ENVVARS", value_delimiter = ',')]
    pub env_vars: Vec<String>,

    #[arg(long, env = "INPUT_DRYRUN")]
    pub dry_run: bool,

    #[arg(long, env = "INPUT_FAILONERROR")]
    pub fail_on_error: bool,

    #[arg(long, env = "INPUT_DISABLESEARCH")]
    pub disable_search: bool,

    /// Uploader release to download.
    #[arg(long = "uploader-version", env = "INPUT_VERSION", default_value = DEFAULT_VERSION)]
    pub uploader_version: String,

    /// Uploader platform build; detected from the host when omitted.
    #[arg(long, env = "INPUT_OS")]
    pub platform: Option<String>,

    #[arg(long, env = "COVUP_KEYS_URL")]
    pub keys_url: Option<String>,

    #[arg(long, env = "COVUP_EXECUTABLE_URL")]
    pub executable_url: Option<String>,

    #[arg(long, env = "COVUP_MANIFEST_URL")]
    pub manifest_url: Option<String>,

    #[arg(long, env = "COVUP_SIGNATURE_URL")]
    pub signature_url: Option<String>,

    /// Directory the working directory is created in.
    #[arg(long, env = "AGENT_TEMPDIRECTORY")]
    pub temp_dir: Option<PathBuf>,

    /// Per-step download timeout in milliseconds.
    #[arg(long, env = "COVUP_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,
}

/// The four download locations of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub keys:        String,
    pub executable:  String,
    pub manifest:    String,
    pub signature:   String,
    /// Local file name of the executable, also its name in the manifest.
    pub binary_name: String,
}

impl Endpoints {
    /// Official endpoints for `version` on `platform`.
    pub fn for_platform(version: &str, platform: UploaderPlatform) -> Self {
        Self::with_base(DEFAULT_CLI_BASE_URL, version, platform)
    }

    /// Endpoints under a mirror laid out like the official CLI host.
    ///
    /// ```
    /// use covup::Endpoints;
    /// use covup_platform::UploaderPlatform;
    ///
    /// let ep = Endpoints::with_base("https://mirror.example/", "v10.4.0", UploaderPlatform::Alpine);
    /// assert_eq!(ep.executable, "https://mirror.example/v10.4.0/alpine/codecov");
    /// assert_eq!(ep.signature, "https://mirror.example/v10.4.0/alpine/codecov.SHA256SUM.sig");
    /// ```
    pub fn with_base(base: &str, version: &str, platform: UploaderPlatform) -> Self {
        let version = non_blank(Some(version)).unwrap_or(DEFAULT_VERSION);
        let binary_name = platform.binary_name();
        let executable = format!(
            "{}/{version}/{platform}/{binary_name}",
            base.trim_end_matches('/')
        );
        Self {
            keys: DEFAULT_KEYS_URL.to_string(),
            manifest: format!("{executable}{MANIFEST_SUFFIX}"),
            signature: format!("{executable}{SIGNATURE_SUFFIX}"),
            executable,
            binary_name: binary_name.to_string(),
        }
    }

    #[must_use]
    pub fn keys_url(mut self, url: impl Into<String>) -> Self {
        self.keys = url.into();
        self
    }

    /// Replace the executable URL. The manifest and signature URLs follow it;
    /// override those afterwards if they live elsewhere.
    #[must_use]
    pub fn executable_url(mut self, url: impl Into<String>) -> Self {
        self.executable = url.into();
        self.manifest = format!("{}{MANIFEST_SUFFIX}", self.executable);
        self.signature = format!("{}{SIGNATURE_SUFFIX}", self.executable);
        self
    }

    #[must_use]
    pub fn manifest_url(mut self, url: impl Into<String>) -> Self {
        self.manifest = url.into();
        self
    }

    #[must_use]
    pub fn signature_url(mut self, url: impl Into<String>) -> Self {
        self.signature = url.into();
        self
    }

    pub fn manifest_file_name(&self) -> String { format!("{}{MANIFEST_SUFFIX}", self.binary_name) }

    pub fn signature_file_name(&self) -> String { format!("{}{SIGNATURE_SUFFIX}", self.binary_name) }
}

/// Everything one run needs, already validated.
#[derive(Debug, Clone)]
pub struct TaskSettings {
    pub token:               TokenInputs,
    pub coverage_file:       Option<String>,
    pub results_folder:      Option<String>,
    pub verbose:             bool,
    pub network_root_folder: Option<PathBuf>,
    pub options:             UploadOptions,
    pub endpoints:           Endpoints,
    /// Parent of the per-run working directory.
    pub temp_dir:            PathBuf,
    /// Directory relative inputs are resolved against; the uploader runs here.
    pub working_dir:         PathBuf,
    pub timeout:             Duration,
}

impl TaskSettings {
    pub fn new(endpoints: Endpoints, temp_dir: PathBuf, working_dir: PathBuf) -> Self {
        Self {
            token: TokenInputs::default(),
            coverage_file: None,
            results_folder: None,
            verbose: false,
            network_root_folder: None,
            options: UploadOptions::default(),
            endpoints,
            temp_dir,
            working_dir,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TaskInputs {
    /// Validate the raw inputs against the host and produce run settings.
    pub fn into_settings(self, working_dir: PathBuf) -> Result<TaskSettings> {
        let platform = match non_blank(self.platform.as_deref()) {
            Some(name) => name.parse::<UploaderPlatform>()?,
            None => UploaderPlatform::detect()?,
        };

        let mut endpoints = Endpoints::for_platform(&self.uploader_version, platform);
        if let Some(url) = non_blank(self.keys_url.as_deref()) {
            endpoints = endpoints.keys_url(url);
        }
        if let Some(url) = non_blank(self.executable_url.as_deref()) {
            endpoints = endpoints.executable_url(url);
        }
        if let Some(url) = non_blank(self.manifest_url.as_deref()) {
            endpoints = endpoints.manifest_url(url);
        }
        if let Some(url) = non_blank(self.signature_url.as_deref()) {
            endpoints = endpoints.signature_url(url);
        }

        let temp_dir = self.temp_dir.unwrap_or_else(std::env::temp_dir);
        let network_root_folder = non_blank(self.network_root_folder.as_deref()).map(PathBuf::from);

        Ok(TaskSettings {
            token: TokenInputs {
                explicit:          self.token,
                pipeline_variable: self.pipeline_token,
            },
            coverage_file: self.coverage_file_name,
            results_folder: self.test_result_folder_name,
            verbose: self.verbose,
            network_root_folder,
            options: UploadOptions {
                build_url:      self.build_url,
                job_code:       self.job_code,
                name:           self.name,
                branch:         self.branch,
                sha:            self.sha,
                pr:             self.pr,
                slug:           self.slug,
                build:          self.build,
                git_service:    self.git_service,
                plugins:        self.plugins,
                flags:          self.flags,
                env_vars:       self.env_vars,
                dry_run:        self.dry_run,
                fail_on_error:  self.fail_on_error,
                disable_search: self.disable_search,
            },
            endpoints,
            temp_dir,
            working_dir,
            timeout: Duration::from_millis(self.timeout_ms),
        })
    }
}

/// Trimmed value, or `None` when absent or blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
