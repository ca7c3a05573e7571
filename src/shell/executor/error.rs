use nix::errno::Errno;
use std::error::Error;
use std::fmt;

/// 执行引擎的错误分类。
///
/// fork 出来的子进程里产生的错误不会以值的形式穿过 fork 边界，
/// 只会体现为退出状态；这里的错误值只在交互进程内传播。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// 内建命令调用格式错误
    Argument(String),
    /// 重定向文件或命令不存在
    NotFound(String),
    /// pipe/fork/open 等系统资源层面的失败
    OsResource { what: &'static str, errno: Errno },
    /// 命令树中出现未实现的操作符
    UnsupportedOperator(String),
}

impl ExecError {
    /// 子进程以该错误终止时使用的退出码
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecError::NotFound(_) => 127,
            _ => 1,
        }
    }

    /// 将 std::io 错误映射到引擎错误分类，`name` 是出错的路径或命令名
    pub fn from_io(name: &str, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            ExecError::NotFound(name.to_string())
        } else {
            ExecError::OsResource {
                what: "open",
                errno: Errno::from_raw(err.raw_os_error().unwrap_or(0)),
            }
        }
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::Argument(message) => write!(f, "{}", message),
            ExecError::NotFound(name) => write!(f, "{}: No such file or directory", name),
            ExecError::OsResource { what, errno } => write!(f, "{}: {}", what, errno.desc()),
            ExecError::UnsupportedOperator(op) => write!(f, "unsupported operator: {}", op),
        }
    }
}

impl Error for ExecError {}
