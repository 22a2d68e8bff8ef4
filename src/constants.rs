//! Constants used throughout stencil

/// Magic bytes identifying the current archive format
pub const ARCHIVE_MAGIC: [u8; 2] = [0x99, 0x88];

/// Magic bytes of the legacy archive format
pub const LEGACY_ARCHIVE_MAGIC: [u8; 2] = [0x99, 0x78];

/// Size of the reserved header region following the magic
pub const ARCHIVE_HEADER_LEN: usize = 4;

/// File extension of saved templates
pub const TEMPLATE_EXTENSION: &str = "stx";

/// File extension of saved profiles
pub const PROFILE_EXTENSION: &str = "json";

/// Language tag of archives built without a blueprint
pub const DEFAULT_LANGUAGE: &str = "none";

/// Default patterns excluded from every CLI build
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    ".direnv",
    ".eggs",
    ".git",
    ".hg",
    ".mypy_cache",
    ".nox",
    ".tox",
    ".venv",
    "venv",
    ".svn",
    "_build",
    "build",
    "dist",
    "buck-out",
    ".pytest_cache",
    ".coverage",
    "*.egg-info",
];

/// Archive size limits, dictated by the fixed-width hex length fields.
pub mod limits {
    /// Largest value a 4-hex-digit field can hold
    pub const MAX_SHORT_FIELD: u64 = 0xFFFF;
    /// Maximum number of files in an archive
    pub const MAX_FILES: u64 = MAX_SHORT_FIELD;
    /// Maximum byte length of a file key
    pub const MAX_FILE_KEY_LEN: u64 = MAX_SHORT_FIELD;
    /// Maximum byte length of a single file (4 GiB)
    pub const MAX_FILE_SIZE: u64 = 0xFFFF_FFFF;
}

/// Symbolic tokens embedded in template paths and contents.
pub mod tokens {
    /// Marker standing in for the project slug in file paths
    pub const PATH_SLUG: &str = "PROJECTSLUG";
    /// Marker inside profile URLs that is replaced by the project name
    pub const URL_PROJECT_NAME: &str = "PROJECTNAME";
    /// Sentinel value of a `starting_version` resolved to today's date
    pub const CALVER: &str = "CALVER";
    /// Sentinel left in deployed content when a value could not be resolved
    pub const NULL: &str = "$:NULL:";

    pub const PROJECT_NAME: &str = "$:project_name:";
    pub const PROJECT_SLUG: &str = "$:project_slug:";
    pub const PROJECT_YEAR: &str = "$:project_year:";
    pub const PROJECT_LICENSE: &str = "$:project_license:";
    pub const PROJECT_ERROR: &str = "$:project_error:";
}

/// Profile fields the resolver knows about.
pub mod fields {
    pub const AUTHOR_NAME: &str = "author_name";
    pub const AUTHOR_NICK: &str = "author_nick";
    pub const AUTHOR_EMAIL: &str = "author_email";
    pub const PREFERRED_LANGUAGE: &str = "preferred_language";
    pub const PREFERRED_LICENSE: &str = "preferred_license";
    pub const STARTING_VERSION: &str = "starting_version";
    pub const VERSION_CONTROL_URL: &str = "version_control_url";
    pub const DOCS_URL: &str = "docs_url";
    pub const CI_URL: &str = "ci_url";

    /// All known fields, in the order profiles store them
    pub const ALL: [&str; 9] = [
        AUTHOR_NAME,
        AUTHOR_NICK,
        AUTHOR_EMAIL,
        PREFERRED_LANGUAGE,
        PREFERRED_LICENSE,
        STARTING_VERSION,
        VERSION_CONTROL_URL,
        DOCS_URL,
        CI_URL,
    ];

    /// Fields whose value gets the project name appended at deploy time
    pub const URLS: [&str; 3] = [VERSION_CONTROL_URL, DOCS_URL, CI_URL];
}

/// Exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
}

/// Verbosity levels
pub mod verbosity {
    pub const OFF: u8 = 0;
    pub const INFO: u8 = 1;
    pub const DEBUG: u8 = 2;
    pub const TRACE: u8 = 3;
}
