#[derive(Clone, Debug)]
pub struct TemplateSettings {
    pub dir: String,
    /// Log tokenizer and AST debug output while rendering
    pub debug: bool,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub debug: bool,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Warnings and errors are appended here when not in debug mode
    pub error_log: String,
    /// Optional directory of `*.sql` files applied after model migrations
    pub migrations_dir: Option<String>,
    pub template: TemplateSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            debug: false,
            host: "127.0.0.1".to_string(),
            port: 5000,
            database_url: "sqlite://gigboard.db".to_string(),
            error_log: "error.log".to_string(),
            migrations_dir: None,
            template: TemplateSettings {
                dir: "templates".to_string(),
                debug: false,
            },
        }
    }
}

impl Settings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
