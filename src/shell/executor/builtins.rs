use log::debug;
use nix::errno::Errno;
use nix::unistd::{chdir, getcwd};
use std::path::{Path, PathBuf};

use super::error::ExecError;

/// `cd` 内建命令，在交互进程中执行，从不 fork。
///
/// 绝对路径直接切换；相对路径先取当前工作目录（每次现取，不缓存）
/// 再拼接。失败时报告出错的路径和系统错误，解释器继续运行。
pub fn cd(tokens: &[String]) -> Result<(), ExecError> {
    if tokens.first().map(String::as_str) != Some("cd") {
        return Err(ExecError::Argument("cd: invalid invocation".to_string()));
    }
    let path = tokens
        .get(1)
        .ok_or_else(|| ExecError::Argument("cd: missing operand".to_string()))?;

    let target = if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        let cwd = getcwd().map_err(|errno| ExecError::OsResource {
            what: "getcwd",
            errno,
        })?;
        cwd.join(path)
    };

    debug!("cd: 切换目录到 {}", target.display());
    chdir(&target).map_err(|errno| match errno {
        Errno::ENOENT => ExecError::NotFound(target.display().to_string()),
        errno => ExecError::OsResource {
            what: "chdir",
            errno,
        },
    })
}
