use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
pub const DEFAULT_IGNORE_FILE_NAME: &str = ".gitignore";
pub const DEFAULT_READ_BATCH_SIZE: usize = 100;

/// Folder names skipped unless hidden content is requested.
pub const DEFAULT_EXCLUDED_FOLDERS: &[&str] = &[
    ".next",
    ".git",
    ".svn",
    ".hg",
    ".github",
    ".vscode",
    ".idea",
    ".DS_Store",
    ".vs",
    ".cache",
    ".npm",
    ".yarn",
    "__pycache__",
];

/// Folder names skipped even when hidden content is requested.
pub const DEFAULT_CRITICAL_FOLDERS: &[&str] = &[".git", ".svn", ".hg"];

pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    // Documentation and text
    "pdf", "doc", "docx", "txt", "rtf", "odt", "md", "markdown", "tex", "latex", "wiki", "rst",
    "adoc", "log", "msg", "pages", "epub", "mobi", "azw3", "djvu",
    // Web
    "html", "htm", "xhtml", "css", "scss", "sass", "less", "styl", "js", "jsx", "ts", "tsx",
    "vue", "svelte", "php", "asp", "aspx", "jsp", "cshtml", "wasm", "wat", "webmanifest",
    "htaccess", "htpasswd", "ejs", "hbs", "handlebars", "pug", "jade", "haml", "liquid",
    // Programming languages
    "py", "pyc", "pyo", "pyd", "pyw", "ipynb", "java", "class", "jar", "war", "cpp", "cc", "cxx",
    "c", "h", "hpp", "hxx", "cs", "csx", "vb", "fs", "fsx", "rb", "rs", "go", "kt", "kts",
    "swift", "scala", "lua", "pl", "pm", "r", "dart", "ex", "exs", "erl", "hs", "clj", "elm",
    "sh", "bash", "zsh", "fish", "ps1", "bat", "cmd", "sql", "mysql", "pgsql", "plsql",
    "sqlite", "mongodb", "cypher", "sparql", "hql", "prisma",
    // Data formats
    "xml", "json", "yaml", "yml", "toml", "csv", "tsv", "ods", "xls", "xlsx", "numbers",
    "proto", "avro", "parquet", "thrift", "graphql", "gql",
    // Configuration
    "ini", "conf", "config", "cfg", "properties", "env", "dist", "local", "docker",
    "dockerfile", "dockerignore", "vagrantfile", "buildpack", "gitignore", "gitattributes",
    "editorconfig", "eslintrc", "prettierrc", "stylelintrc", "babelrc", "npmrc", "yarnrc",
    "nvmrc", "gradle", "pom", "ivy", "ant", "cmake", "make", "mak", "makefile", "kubernetes",
    "helm", "terraform", "tf", "vcxproj", "csproj", "sln", "pbxproj",
    // Editors
    "vim", "vimrc", "gvimrc", "ideavimrc", "vscode", "sublime-project", "sublime-workspace",
    "workspace", "project", "code-workspace",
    // Templates
    "tpl", "tmpl", "template", "mustache", "nunjucks", "njk", "jinja", "j2", "erb", "eex",
    "leex", "swig",
    // Build output
    "map", "min", "bundle", "pack", "out", "build", "release",
    // Certificates
    "pem", "crt", "ca-bundle", "p12", "pfx", "key", "keystore", "csr", "cert",
    // Game development
    "unity", "unitypackage", "prefab", "asset", "blend", "blend1", "fbx", "obj", "mtl",
    "gltf", "glb", "uasset", "umap",
    // Machine learning
    "onnx", "pkl", "joblib", "h5", "hdf5", "pb", "pbtxt", "ckpt", "model",
    // Cloud and serverless
    "aws", "azure", "gcp", "cloudformation", "sam", "serverless", "netlify", "vercel",
];

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub allowed_extensions: Vec<String>,
    pub max_file_size: u64,
    pub include_hidden: bool,
    pub excluded_folders: Vec<String>,
    pub critical_folders: Vec<String>,
    pub ignore_file_name: String,
    pub read_batch_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: to_strings(DEFAULT_ALLOWED_EXTENSIONS),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            include_hidden: false,
            excluded_folders: to_strings(DEFAULT_EXCLUDED_FOLDERS),
            critical_folders: to_strings(DEFAULT_CRITICAL_FOLDERS),
            ignore_file_name: DEFAULT_IGNORE_FILE_NAME.to_string(),
            read_batch_size: DEFAULT_READ_BATCH_SIZE,
        }
    }
}

impl AppConfig {
    /// Replace the extension allow-list, normalising each entry.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().to_string())
            .collect();
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn with_include_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// Extension list trimmed, without leading dots, lowercased, blanks dropped.
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.allowed_extensions
            .iter()
            .map(|e| normalize_extension(e))
            .filter(|e| !e.is_empty())
            .collect()
    }

    /// Settings-boundary checks. Nothing invalid gets past here into a scan.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.normalized_extensions().is_empty() {
            return Err(ConfigError::Message(
                "allowed_extensions must contain at least one extension".to_string(),
            ));
        }
        if self.max_file_size == 0 {
            return Err(ConfigError::Message(
                "max_file_size must be greater than zero".to_string(),
            ));
        }
        if self.read_batch_size == 0 {
            return Err(ConfigError::Message(
                "read_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.ignore_file_name.trim().is_empty() {
            return Err(ConfigError::Message(
                "ignore_file_name must not be empty".to_string(),
            ));
        }
        let strict_subset = self
            .critical_folders
            .iter()
            .all(|c| self.excluded_folders.contains(c))
            && self.critical_folders.len() < self.excluded_folders.len();
        if !strict_subset {
            return Err(ConfigError::Message(
                "critical_folders must be a strict subset of excluded_folders".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Load `Config.*` from the working directory (optional), then `INTAKE_*`
/// environment overrides, then validate.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("INTAKE").try_parsing(true))
        .build()?;
    let config = builder.try_deserialize::<AppConfig>()?;
    config.validate()?;
    Ok(config)
}
