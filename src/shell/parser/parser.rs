use super::ast::{Builtin, CommandTree, PipelineNode, SimpleCommand};
use super::lexer::{Lexer, RedirectOp, Token};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
        }
    }

    fn next_token(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    /// 解析一整行，构造命令树。
    ///
    /// 管道右结合：`a | b | c` 解析为 `(| a (| b c))`，递归深度
    /// 等于管道长度，与求值器的 fork 嵌套一一对应。
    pub fn parse_command(&mut self) -> Result<CommandTree, String> {
        let command = self.parse_simple_command()?;

        match self.current_token {
            Token::EOF => Ok(CommandTree::Simple(command)),
            Token::Pipe => {
                self.next_token();
                let right = self.parse_command()?;
                Ok(CommandTree::Pipeline(PipelineNode {
                    operator: String::from("|"),
                    left: Box::new(CommandTree::Simple(command)),
                    right: Box::new(right),
                }))
            }
            ref token => Err(format!("unexpected token: {:?}", token)),
        }
    }

    fn parse_simple_command(&mut self) -> Result<SimpleCommand, String> {
        let mut command = SimpleCommand::default();

        // 解析命令名
        match &self.current_token {
            Token::Word(word) => {
                command.builtin = Builtin::classify(word);
                command.tokens.push(word.clone());
                self.next_token();
            }
            _ => return Err("expected command name".to_string()),
        }

        // 解析参数和重定向
        loop {
            match &self.current_token {
                Token::EOF | Token::Pipe => break,
                Token::Redirect(op) => {
                    let op = op.clone();
                    let filename = self.parse_redirect_target()?;
                    match op {
                        RedirectOp::Input => command.stdin_path = Some(filename),
                        RedirectOp::Output => command.stdout_path = Some(filename),
                        RedirectOp::Error => command.stderr_path = Some(filename),
                    }
                }
                Token::Word(word) => {
                    command.tokens.push(word.clone());
                    self.next_token();
                }
            }
        }

        Ok(command)
    }

    fn parse_redirect_target(&mut self) -> Result<String, String> {
        self.next_token(); // 跳过重定向操作符

        match &self.current_token {
            Token::Word(filename) => {
                let filename = filename.clone();
                self.next_token();
                Ok(filename)
            }
            _ => Err("expected filename after redirection operator".to_string()),
        }
    }
}
