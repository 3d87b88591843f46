/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时处理的未缓存成分管线数量（信号量容量）
    pub parallel_rate_limit: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    /// LLM API 密钥（为空时走降级路径，不发起调用）
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 数据源配置 ---
    pub usda_api_key: String,
    pub wikipedia_api_base_url: String,
    pub open_food_facts_api_base_url: String,
    pub usda_api_base_url: String,
    pub pubchem_api_base_url: String,
    pub duckduckgo_api_base_url: String,
    /// PubChem 单次请求超时（秒）
    pub pubchem_timeout_secs: u64,
    /// PubChem 超时重试次数
    pub pubchem_max_retries: usize,
    /// DuckDuckGo 每次查询前的强制间隔（秒）
    pub duckduckgo_rate_limit_delay_secs: u64,
    /// DuckDuckGo 单条查询的传输错误重试次数
    pub duckduckgo_max_retries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parallel_rate_limit: 10,
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-2.0-flash".to_string(),
            usda_api_key: "DEMO_KEY".to_string(),
            wikipedia_api_base_url: "https://en.wikipedia.org/w/api.php".to_string(),
            open_food_facts_api_base_url: "https://world.openfoodfacts.org/api/v0".to_string(),
            usda_api_base_url: "https://api.nal.usda.gov/fdc/v1".to_string(),
            pubchem_api_base_url: "https://pubchem.ncbi.nlm.nih.gov/rest/pug".to_string(),
            duckduckgo_api_base_url: "https://api.duckduckgo.com".to_string(),
            pubchem_timeout_secs: 2,
            pubchem_max_retries: 2,
            duckduckgo_rate_limit_delay_secs: 2,
            duckduckgo_max_retries: 2,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            parallel_rate_limit: std::env::var("PARALLEL_RATE_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.parallel_rate_limit),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            usda_api_key: std::env::var("USDA_API_KEY").unwrap_or(default.usda_api_key),
            wikipedia_api_base_url: std::env::var("WIKIPEDIA_API_BASE_URL").unwrap_or(default.wikipedia_api_base_url),
            open_food_facts_api_base_url: std::env::var("OPEN_FOOD_FACTS_API_BASE_URL").unwrap_or(default.open_food_facts_api_base_url),
            usda_api_base_url: std::env::var("USDA_API_BASE_URL").unwrap_or(default.usda_api_base_url),
            pubchem_api_base_url: std::env::var("PUBCHEM_API_BASE_URL").unwrap_or(default.pubchem_api_base_url),
            duckduckgo_api_base_url: std::env::var("DUCKDUCKGO_API_BASE_URL").unwrap_or(default.duckduckgo_api_base_url),
            pubchem_timeout_secs: std::env::var("PUBCHEM_TIMEOUT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.pubchem_timeout_secs),
            pubchem_max_retries: std::env::var("PUBCHEM_MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.pubchem_max_retries),
            duckduckgo_rate_limit_delay_secs: std::env::var("DUCKDUCKGO_RATE_LIMIT_DELAY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.duckduckgo_rate_limit_delay_secs),
            duckduckgo_max_retries: std::env::var("DUCKDUCKGO_MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.duckduckgo_max_retries),
        }
    }
}
