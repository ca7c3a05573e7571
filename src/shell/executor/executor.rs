use log::{debug, error};
use nix::errno::Errno;
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{dup2, execvp, fork, pipe, ForkResult, Pid};
use std::ffi::CString;
use std::os::fd::AsRawFd;
use std::process;

use crate::shell::parser::ast::{Builtin, CommandTree, PipelineNode, SimpleCommand};

use super::builtins;
use super::error::ExecError;
use super::redirect;

/// 一行命令执行完后交还给前端的结果
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// 继续交互循环，附带这一行的退出状态
    Continue(i32),
    /// exit 内建命令：请求前端结束循环
    Exit,
}

pub struct Engine;

impl Engine {
    /// 执行一棵命令树（每行输入一棵）。
    ///
    /// 树根是单条命令时走单命令路径（先询问内建分发）；树根是管道
    /// 节点时本进程就是编排进程，递归求值直到叶子在 fork 出的子进程
    /// 里 exec。交互进程自己的标准流在任何路径下都不会被改动。
    pub fn execute(tree: &CommandTree) -> Result<Outcome, ExecError> {
        match tree {
            CommandTree::Simple(command) => Self::execute_simple(command),
            CommandTree::Pipeline(_) => Ok(Outcome::Continue(Self::eval(tree)?)),
        }
    }

    /// 单条命令：内建命令在本进程处理，其余 fork 一个子进程执行
    fn execute_simple(command: &SimpleCommand) -> Result<Outcome, ExecError> {
        match command.builtin {
            // exit 必须在任何 fork 逻辑之前短路
            Builtin::Exit => Ok(Outcome::Exit),
            Builtin::Cd => {
                builtins::cd(&command.tokens)?;
                Ok(Outcome::Continue(0))
            }
            Builtin::None => match unsafe { fork() } {
                Ok(ForkResult::Child) => {
                    let err = match redirect::apply(command) {
                        Ok(()) => Self::exec_program(&command.tokens),
                        Err(err) => err,
                    };
                    Self::exit_with(err)
                }
                Ok(ForkResult::Parent { child, .. }) => {
                    Ok(Outcome::Continue(Self::wait_child(child)))
                }
                Err(errno) => Err(ExecError::OsResource {
                    what: "fork",
                    errno,
                }),
            },
        }
    }

    /// 递归求值命令树。
    ///
    /// 调用约定：除了树根，本函数总是运行在一个已经 fork 出来、标准
    /// 流已接好的子进程里，所以叶子命令直接在当前进程 exec，再 fork
    /// 一层只会让程序跑在一个多余的孙进程里。
    fn eval(tree: &CommandTree) -> Result<i32, ExecError> {
        match tree {
            CommandTree::Simple(command) => {
                // 内建命令作为管道一环没有意义，按约定静默跳过；
                // 深入管道的 exit 只结束它所在的子进程，不影响父 shell
                if command.builtin != Builtin::None {
                    debug!("管道中的内建命令被忽略: {:?}", command.tokens);
                    return Ok(0);
                }
                redirect::apply(command)?;
                Err(Self::exec_program(&command.tokens))
            }
            CommandTree::Pipeline(node) => Self::eval_pipeline(node),
        }
    }

    /// 管道节点：一条管道、两次 fork。
    ///
    /// fork 之后三个进程各自立刻关掉用不到的管道端——所有写端副本
    /// 都关闭之后读端才能看到 EOF，漏关任何一个都会造成死锁或描述符
    /// 泄漏。
    fn eval_pipeline(node: &PipelineNode) -> Result<i32, ExecError> {
        if node.operator != "|" {
            return Err(ExecError::UnsupportedOperator(node.operator.clone()));
        }

        let (read_end, write_end) = pipe().map_err(|errno| ExecError::OsResource {
            what: "pipe",
            errno,
        })?;

        // 左子进程：只保留写端，标准输出接到管道
        let left = match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                drop(read_end);
                if let Err(errno) = dup2(write_end.as_raw_fd(), libc::STDOUT_FILENO) {
                    Self::exit_with(ExecError::OsResource {
                        what: "dup2",
                        errno,
                    });
                }
                drop(write_end);
                Self::exit_eval(&node.left)
            }
            Ok(ForkResult::Parent { child, .. }) => child,
            Err(errno) => {
                return Err(ExecError::OsResource {
                    what: "fork",
                    errno,
                })
            }
        };

        // 右子进程：只保留读端，标准输入接到管道
        let right = match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                drop(write_end);
                if let Err(errno) = dup2(read_end.as_raw_fd(), libc::STDIN_FILENO) {
                    Self::exit_with(ExecError::OsResource {
                        what: "dup2",
                        errno,
                    });
                }
                drop(read_end);
                Self::exit_eval(&node.right)
            }
            Ok(ForkResult::Parent { child, .. }) => child,
            Err(errno) => {
                // 已经创建的左子进程必须回收，不能留成孤儿
                drop(read_end);
                drop(write_end);
                Self::wait_child(left);
                return Err(ExecError::OsResource {
                    what: "fork",
                    errno,
                });
            }
        };

        // 编排进程不持有任何管道端
        drop(read_end);
        drop(write_end);

        let left_status = Self::wait_child(left);
        let right_status = Self::wait_child(right);
        debug!(
            "管道两侧退出状态: left={} right={}",
            left_status, right_status
        );

        // 整条管道的状态取最后一级
        Ok(right_status)
    }

    /// 子进程对子树求值后以其状态退出，绝不返回交互循环
    fn exit_eval(tree: &CommandTree) -> ! {
        match Self::eval(tree) {
            Ok(status) => process::exit(status),
            Err(err) => Self::exit_with(err),
        }
    }

    /// 子进程报告错误并以对应的非零状态退出
    fn exit_with(err: ExecError) -> ! {
        eprintln!("minnow: {}", err);
        process::exit(err.exit_code())
    }

    /// 用 execvp 替换当前进程映像，`tokens[0]` 按 PATH 解析，
    /// `tokens` 整体作为参数向量。只在失败时返回。
    fn exec_program(tokens: &[String]) -> ExecError {
        let mut argv = Vec::with_capacity(tokens.len());
        for token in tokens {
            match CString::new(token.as_str()) {
                Ok(arg) => argv.push(arg),
                Err(_) => {
                    return ExecError::Argument(format!("{}: invalid nul in argument", token))
                }
            }
        }
        let Some(program) = argv.first() else {
            return ExecError::Argument("empty command".to_string());
        };

        // Rust 运行时会把 SIGPIPE 设成忽略，exec 前恢复默认处置
        unsafe {
            let _ = signal(Signal::SIGPIPE, SigHandler::SigDfl);
        }

        match execvp(program, &argv) {
            Err(Errno::ENOENT) => ExecError::NotFound(tokens[0].clone()),
            Err(errno) => ExecError::OsResource {
                what: "execvp",
                errno,
            },
            Ok(infallible) => match infallible {},
        }
    }

    /// 阻塞等待一个直接子进程，把等待结果折算成退出状态；
    /// 信号致死按 128+signo 计
    fn wait_child(pid: Pid) -> i32 {
        loop {
            match waitpid(pid, None) {
                Ok(WaitStatus::Exited(_, code)) => return code,
                Ok(WaitStatus::Signaled(_, sig, _)) => return 128 + sig as i32,
                Ok(status) => {
                    debug!("忽略中间等待状态: {:?}", status);
                }
                Err(Errno::EINTR) => {}
                Err(errno) => {
                    error!("waitpid 失败: {}", errno);
                    return 1;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn simple(words: &[&str]) -> SimpleCommand {
        SimpleCommand {
            tokens: words.iter().map(|w| w.to_string()).collect(),
            builtin: Builtin::classify(words[0]),
            ..SimpleCommand::default()
        }
    }

    fn simple_tree(words: &[&str]) -> CommandTree {
        CommandTree::Simple(simple(words))
    }

    fn pipe_node(left: CommandTree, right: CommandTree) -> CommandTree {
        CommandTree::Pipeline(PipelineNode {
            operator: String::from("|"),
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn tmp_path(tag: &str) -> PathBuf {
        let path =
            std::env::temp_dir().join(format!("minnow_exec_{}_{}", tag, std::process::id()));
        fs::remove_file(&path).ok();
        path
    }

    #[test]
    fn test_exit_is_a_sentinel() {
        let outcome = Engine::execute(&simple_tree(&["exit"])).unwrap();
        assert_eq!(outcome, Outcome::Exit);
    }

    #[test]
    fn test_exit_status_is_propagated() {
        let outcome = Engine::execute(&simple_tree(&["sh", "-c", "exit 7"])).unwrap();
        assert_eq!(outcome, Outcome::Continue(7));
    }

    #[test]
    fn test_unknown_command_exits_127() {
        let outcome = Engine::execute(&simple_tree(&["minnow-no-such-cmd"])).unwrap();
        assert_eq!(outcome, Outcome::Continue(127));
    }

    #[test]
    fn test_stdout_redirection_appends() {
        let path = tmp_path("stdout");
        let mut command = simple(&["echo", "hello"]);
        command.stdout_path = Some(path.display().to_string());
        let tree = CommandTree::Simple(command);

        assert_eq!(Engine::execute(&tree).unwrap(), Outcome::Continue(0));
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");

        // 重复执行是追加而不是截断
        assert_eq!(Engine::execute(&tree).unwrap(), Outcome::Continue(0));
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\nhello\n");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_stdin_redirection() {
        let input = tmp_path("stdin_src");
        let output = tmp_path("stdin_dst");
        fs::write(&input, "over the stream\n").unwrap();

        let mut command = simple(&["cat"]);
        command.stdin_path = Some(input.display().to_string());
        command.stdout_path = Some(output.display().to_string());

        let outcome = Engine::execute(&CommandTree::Simple(command)).unwrap();
        assert_eq!(outcome, Outcome::Continue(0));
        assert_eq!(fs::read_to_string(&output).unwrap(), "over the stream\n");
        fs::remove_file(&input).ok();
        fs::remove_file(&output).ok();
    }

    #[test]
    fn test_missing_stdin_file_fails_in_child() {
        let mut command = simple(&["cat"]);
        command.stdin_path = Some("/definitely/not/a/file/minnow".to_string());

        match Engine::execute(&CommandTree::Simple(command)).unwrap() {
            Outcome::Continue(status) => assert_ne!(status, 0),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_pipeline_transfers_exact_bytes() {
        let path = tmp_path("pipe_bytes");
        let mut counter = simple(&["wc", "-c"]);
        counter.stdout_path = Some(path.display().to_string());

        let tree = pipe_node(
            simple_tree(&["echo", "hello"]),
            CommandTree::Simple(counter),
        );
        let outcome = Engine::execute(&tree).unwrap();
        assert_eq!(outcome, Outcome::Continue(0));
        // "hello\n" 恰好六个字节
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "6");
        fs::remove_file(&path).ok();
    }

    // 10 MB 穿过三级管道：验证所有写端副本都被关闭、读端能看到
    // EOF、三个进程都被回收，而不是卡死
    #[test]
    fn test_three_stage_pipeline_large_volume() {
        let path = tmp_path("pipe_large");
        let mut counter = simple(&["wc", "-c"]);
        counter.stdout_path = Some(path.display().to_string());

        let tree = pipe_node(
            simple_tree(&["head", "-c", "10000000", "/dev/zero"]),
            pipe_node(simple_tree(&["cat"]), CommandTree::Simple(counter)),
        );
        let outcome = Engine::execute(&tree).unwrap();
        assert_eq!(outcome, Outcome::Continue(0));
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "10000000");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_builtin_in_pipeline_is_ignored() {
        let path = tmp_path("pipe_builtin");
        let mut counter = simple(&["wc", "-c"]);
        counter.stdout_path = Some(path.display().to_string());

        // cd 作为管道一环被跳过：wc 直接看到 EOF，计数为零
        let tree = pipe_node(simple_tree(&["cd", "/"]), CommandTree::Simple(counter));
        let outcome = Engine::execute(&tree).unwrap();
        assert_eq!(outcome, Outcome::Continue(0));
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "0");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_exit_in_pipeline_only_ends_subprocess() {
        // 深入管道的 exit 只结束它所在的子进程，执行正常返回
        let tree = pipe_node(simple_tree(&["echo", "x"]), simple_tree(&["exit"]));
        let outcome = Engine::execute(&tree).unwrap();
        assert_eq!(outcome, Outcome::Continue(0));
    }

    #[test]
    fn test_unsupported_operator_is_rejected() {
        let tree = CommandTree::Pipeline(PipelineNode {
            operator: String::from("&&"),
            left: Box::new(simple_tree(&["echo", "a"])),
            right: Box::new(simple_tree(&["echo", "b"])),
        });
        assert_eq!(
            Engine::execute(&tree),
            Err(ExecError::UnsupportedOperator("&&".to_string()))
        );
    }

    #[test]
    fn test_pipeline_status_comes_from_last_stage() {
        let tree = pipe_node(
            simple_tree(&["echo", "x"]),
            simple_tree(&["sh", "-c", "cat > /dev/null; exit 5"]),
        );
        let outcome = Engine::execute(&tree).unwrap();
        assert_eq!(outcome, Outcome::Continue(5));
    }
}
