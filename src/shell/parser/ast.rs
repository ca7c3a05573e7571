//! 一行输入解析后的命令树。解析器构造一次，执行引擎消费一次，
//! 整棵树不会比一行输入活得更久。

/// 内建命令类型，由 `tokens[0]` 推导
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    None,
    Cd,
    Exit,
}

impl Builtin {
    pub fn classify(word: &str) -> Self {
        match word {
            "cd" => Builtin::Cd,
            "exit" => Builtin::Exit,
            _ => Builtin::None,
        }
    }
}

impl Default for Builtin {
    fn default() -> Self {
        Builtin::None
    }
}

/// 单条命令：程序名 + 参数 + 可选的重定向目标。
///
/// 不变式：`tokens` 非空，`tokens[0]` 是程序名或内建命令名；
/// 当 `builtin != Builtin::None` 时重定向字段按约定被忽略
/// （内建命令在交互进程中执行，不参与 fork 出来的流接线）。
#[derive(Debug, Clone, Default)]
pub struct SimpleCommand {
    pub tokens: Vec<String>,
    pub stdin_path: Option<String>,
    pub stdout_path: Option<String>,
    pub stderr_path: Option<String>,
    pub builtin: Builtin,
}

/// 管道节点。目前只有 `"|"` 有意义，其他操作符是保留的扩展点。
///
/// 不变式：两个子树都存在，树有限且无环（解析器自底向上构造，
/// 求值器自顶向下消费）。
#[derive(Debug)]
pub struct PipelineNode {
    pub operator: String,
    pub left: Box<CommandTree>,
    pub right: Box<CommandTree>,
}

#[derive(Debug)]
pub enum CommandTree {
    Simple(SimpleCommand),
    Pipeline(PipelineNode),
}
