use std::fmt;

/// 应用程序错误类型
///
/// 本核心的容错策略：数据源失败与 LLM 失败都在管线内部降级吸收，
/// 唯一向调用方传播的硬错误是缓存故障——去重与短路语义依赖缓存的正确性
#[derive(Debug)]
pub enum AppError {
    /// 缓存错误（致命，直接传播给调用方）
    Cache(CacheError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Cache(e) => write!(f, "缓存错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Cache(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 缓存相关错误
#[derive(Debug)]
pub enum CacheError {
    /// 缓存内部锁被毒化（持锁线程 panic）
    LockPoisoned {
        operation: &'static str,
    },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::LockPoisoned { operation } => {
                write!(f, "缓存锁被毒化 (操作: {})", operation)
            }
        }
    }
}

impl std::error::Error for CacheError {}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::Cache(err)
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
