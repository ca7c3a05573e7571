use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Word(String),
    Pipe,
    Redirect(RedirectOp),
    EOF,
}

#[derive(Debug, PartialEq, Clone)]
pub enum RedirectOp {
    Input,  // <
    Output, // >
    Error,  // 2>
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.chars().peekable(),
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        match self.peek_char() {
            None => Token::EOF,
            Some(c) => match c {
                '|' => {
                    self.read_char();
                    Token::Pipe
                }
                '<' => {
                    self.read_char();
                    Token::Redirect(RedirectOp::Input)
                }
                '>' => {
                    self.read_char();
                    Token::Redirect(RedirectOp::Output)
                }
                '2' => {
                    // "2>" 只有紧邻时才是操作符，否则按普通单词处理
                    self.read_char();
                    if self.peek_char() == Some('>') {
                        self.read_char();
                        Token::Redirect(RedirectOp::Error)
                    } else {
                        self.read_word_with_prefix('2')
                    }
                }
                _ => {
                    let first = self.read_char().unwrap_or_default();
                    self.read_word_with_prefix(first)
                }
            },
        }
    }

    fn read_char(&mut self) -> Option<char> {
        self.input.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.read_char();
        }
    }

    fn read_word_with_prefix(&mut self, first: char) -> Token {
        let mut word = String::new();
        word.push(first);

        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || "<>|".contains(c) {
                break;
            }
            word.push(self.read_char().unwrap_or_default());
        }

        Token::Word(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_command() {
        let mut lexer = Lexer::new("ls -l");
        assert_eq!(lexer.next_token(), Token::Word("ls".to_string()));
        assert_eq!(lexer.next_token(), Token::Word("-l".to_string()));
        assert_eq!(lexer.next_token(), Token::EOF);
    }

    #[test]
    fn test_pipe() {
        let mut lexer = Lexer::new("ls | grep foo");
        assert_eq!(lexer.next_token(), Token::Word("ls".to_string()));
        assert_eq!(lexer.next_token(), Token::Pipe);
        assert_eq!(lexer.next_token(), Token::Word("grep".to_string()));
        assert_eq!(lexer.next_token(), Token::Word("foo".to_string()));
        assert_eq!(lexer.next_token(), Token::EOF);
    }

    #[test]
    fn test_redirections() {
        let mut lexer = Lexer::new("sort < in.txt > out.txt 2> err.txt");
        assert_eq!(lexer.next_token(), Token::Word("sort".to_string()));
        assert_eq!(lexer.next_token(), Token::Redirect(RedirectOp::Input));
        assert_eq!(lexer.next_token(), Token::Word("in.txt".to_string()));
        assert_eq!(lexer.next_token(), Token::Redirect(RedirectOp::Output));
        assert_eq!(lexer.next_token(), Token::Word("out.txt".to_string()));
        assert_eq!(lexer.next_token(), Token::Redirect(RedirectOp::Error));
        assert_eq!(lexer.next_token(), Token::Word("err.txt".to_string()));
        assert_eq!(lexer.next_token(), Token::EOF);
    }

    #[test]
    fn test_word_starting_with_two() {
        let mut lexer = Lexer::new("echo 2048 2>log");
        assert_eq!(lexer.next_token(), Token::Word("echo".to_string()));
        assert_eq!(lexer.next_token(), Token::Word("2048".to_string()));
        assert_eq!(lexer.next_token(), Token::Redirect(RedirectOp::Error));
        assert_eq!(lexer.next_token(), Token::Word("log".to_string()));
        assert_eq!(lexer.next_token(), Token::EOF);
    }

    #[test]
    fn test_operators_without_spaces() {
        let mut lexer = Lexer::new("a|b>c");
        assert_eq!(lexer.next_token(), Token::Word("a".to_string()));
        assert_eq!(lexer.next_token(), Token::Pipe);
        assert_eq!(lexer.next_token(), Token::Word("b".to_string()));
        assert_eq!(lexer.next_token(), Token::Redirect(RedirectOp::Output));
        assert_eq!(lexer.next_token(), Token::Word("c".to_string()));
        assert_eq!(lexer.next_token(), Token::EOF);
    }
}
