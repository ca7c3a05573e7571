use colored::Colorize;

pub struct Theme {
    pub prompt_suffix: String,
    pub error_symbol: String,
    pub exit_message: String,
    pub prompt_style: Box<dyn Fn(String) -> String>,
    pub error_style: Box<dyn Fn(String) -> String>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            prompt_suffix: "> ".to_string(),
            error_symbol: "✗".red().to_string(),
            exit_message: "minnow 游走了～".bright_blue().to_string(),
            prompt_style: Box::new(|s| s.bright_cyan().to_string()),
            error_style: Box::new(|s| s.bright_red().to_string()),
        }
    }
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }
}
