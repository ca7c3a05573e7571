use nix::unistd::dup2;
use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;

use crate::shell::parser::ast::SimpleCommand;

use super::error::ExecError;

/// 在当前进程的描述符表上重绑定标准流。
///
/// 只允许在 fork 之后、exec 之前的子进程里调用，绝不能在交互进程里
/// 调用；对兄弟进程和父进程没有任何影响。任一文件打不开就立即返回，
/// 调用方（子进程）应当以非零状态退出，而不是带着配置了一半的环境
/// 去 exec。
pub fn apply(command: &SimpleCommand) -> Result<(), ExecError> {
    if let Some(path) = &command.stdin_path {
        // 输入文件必须已经存在
        let file = File::open(path).map_err(|err| ExecError::from_io(path, &err))?;
        rebind(&file, libc::STDIN_FILENO)?;
    }

    if let Some(path) = &command.stdout_path {
        let file = open_output(path).map_err(|err| ExecError::from_io(path, &err))?;
        rebind(&file, libc::STDOUT_FILENO)?;
    }

    if let Some(path) = &command.stderr_path {
        let file = open_output(path).map_err(|err| ExecError::from_io(path, &err))?;
        rebind(&file, libc::STDERR_FILENO)?;
    }

    Ok(())
}

/// 输出目标：不存在则创建，存在则追加
fn open_output(path: &str) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .append(true)
        .mode(0o700)
        .open(path)
}

fn rebind(file: &File, stdfd: i32) -> Result<(), ExecError> {
    dup2(file.as_raw_fd(), stdfd).map_err(|errno| ExecError::OsResource {
        what: "dup2",
        errno,
    })?;
    // file 在此离开作用域，复制完成后的原描述符随之释放
    Ok(())
}
