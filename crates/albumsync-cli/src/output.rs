/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Human
        }
    }

    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Prints a headline for a completed action.
    pub fn success(self, message: &str) {
        match self {
            Self::Human => println!("\u{2713} {message}"),
            Self::Json => println!("{}", serde_json::json!({"success": true, "message": message})),
        }
    }

    /// Prints an error without terminating the program.
    pub fn error(self, message: &str) {
        match self {
            Self::Human => eprintln!("\u{2717} Error: {message}"),
            Self::Json => eprintln!("{}", serde_json::json!({"success": false, "error": message})),
        }
    }

    /// Prints an indented detail line; suppressed in JSON mode, where the
    /// structured payload carries the information instead.
    pub fn detail(self, message: &str) {
        if let Self::Human = self {
            println!("  {message}");
        }
    }

    /// Prints a structured payload; suppressed in human mode.
    pub fn payload(self, value: &serde_json::Value) {
        if let Self::Json = self {
            println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
        }
    }
}
