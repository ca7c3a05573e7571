use log::{debug, error, warn};
use nix::unistd::getcwd;
use std::error::Error;
use std::io::Write;

use crate::shell::executor::{Engine, Outcome};
use crate::shell::parser::parser::Parser;
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::utils::config::Config;
use crate::utils::theme::Theme;

pub struct Shell<'a> {
    theme: Theme,
    readline: Option<ReadlineManager<'a>>,
    config: &'a Config,
    last_status: i32,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            theme: Theme::new(),
            readline: None,
            config,
            last_status: 0,
        }
    }

    pub fn run(&mut self) -> Result<(), Box<dyn Error>> {
        debug!("初始化 MinnowShell...");
        let mut readline = ReadlineManager::new(self.config)?;
        readline.load_history();
        self.readline = Some(readline);

        self.run_loop();

        if let Some(readline) = self.readline.as_mut() {
            readline.save_history();
        }
        println!("{}", self.theme.exit_message);
        debug!("退出 MinnowShell, 最后一条命令状态: {}", self.last_status);
        Ok(())
    }

    fn run_loop(&mut self) {
        loop {
            let prompt = self.prompt();
            let readline = match self.readline.as_mut() {
                Some(readline) => readline,
                None => return,
            };

            match readline.readline(&prompt) {
                Ok(line) => {
                    if !self.handle_input(&line) {
                        break;
                    }
                }
                Err(ReadlineError::Eof) => {
                    warn!("接收到 EOF，退出交互循环...");
                    break;
                }
                Err(ReadlineError::Interrupted) => {
                    warn!("接收到中断信号...");
                    continue;
                }
                Err(err) => {
                    error!("readline 错误: {}", err);
                    self.report(&format!("{}", err));
                    break;
                }
            }
        }
    }

    /// 处理一行输入。返回 false 表示 exit 请求结束循环。
    fn handle_input(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return true;
        }

        if let Some(readline) = self.readline.as_mut() {
            readline.add_history(line);
        }
        debug!("执行命令: {}", line);

        // 一行一棵命令树，执行完即释放
        let tree = match Parser::new(line).parse_command() {
            Ok(tree) => tree,
            Err(err) => {
                self.report(&err);
                self.last_status = 1;
                return true;
            }
        };

        match Engine::execute(&tree) {
            Ok(Outcome::Exit) => {
                debug!("exit: 结束交互循环");
                false
            }
            Ok(Outcome::Continue(status)) => {
                if status != 0 {
                    debug!("命令退出状态: {}", status);
                }
                self.last_status = status;
                true
            }
            Err(err) => {
                self.report(&format!("{}", err));
                self.last_status = err.exit_code();
                true
            }
        }
    }

    fn prompt(&self) -> String {
        let cwd = getcwd()
            .map(|path| path.display().to_string())
            .unwrap_or_default();
        (self.theme.prompt_style)(format!("{}{}", cwd, self.theme.prompt_suffix))
    }

    fn report(&self, message: &str) {
        let _ = std::io::stdout().flush();
        eprintln!(
            "{} {}",
            self.theme.error_symbol,
            (self.theme.error_style)(format!("{}: {}", self.config.name, message))
        );
    }
}
