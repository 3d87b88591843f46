//! 管线集成测试
//!
//! 用桩适配器与桩推理服务验证编排层的核心语义：
//! 缓存短路、并发上限、失败隔离、批次汇总

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map};

use food_analyzer::cache::IngredientCache;
use food_analyzer::models::{DietType, SourceId, SourcePayload, SourceResult, DESC_NO_INFO};
use food_analyzer::services::Oracle;
use food_analyzer::sources::SourceAdapter;
use food_analyzer::{App, Config, IngredientProfile, UserPreferences};

/// 记录调用次数与并发水位的桩适配器
struct CountingAdapter {
    id: SourceId,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

#[derive(Clone)]
enum Behavior {
    Found(SourcePayload),
    NotFound,
    Failed,
}

impl CountingAdapter {
    fn new(id: SourceId, behavior: Behavior, gauges: &Gauges) -> Arc<Self> {
        Arc::new(Self {
            id,
            behavior,
            calls: Arc::clone(&gauges.calls),
            active: Arc::clone(&gauges.active),
            max_active: Arc::clone(&gauges.max_active),
        })
    }
}

#[async_trait]
impl SourceAdapter for CountingAdapter {
    fn id(&self) -> SourceId {
        self.id
    }

    async fn fetch(&self, _ingredient: &str) -> SourceResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(20)).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Found(payload) => SourceResult::found(self.id, payload.clone()),
            Behavior::NotFound => SourceResult::not_found(self.id),
            Behavior::Failed => SourceResult::failed(self.id, "connection refused"),
        }
    }
}

/// 共享计数器
#[derive(Default)]
struct Gauges {
    calls: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

/// 返回固定 JSON 并记录全部提示词的桩推理服务
struct RecordingOracle {
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
    response: String,
}

impl RecordingOracle {
    fn new(response: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            response: response.to_string(),
        })
    }
}

#[async_trait]
impl Oracle for RecordingOracle {
    async fn invoke(&self, prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.response.clone())
    }
}

/// 始终失败的桩推理服务
struct UnavailableOracle;

#[async_trait]
impl Oracle for UnavailableOracle {
    async fn invoke(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("service unavailable")
    }
}

const INGREDIENT_RESPONSE: &str = r#"{"safety_rating": 7, "health_effects": ["preservative"],
    "description": "A synthesized profile.", "alternate_names": ["E-test"],
    "allergic_info": [], "diet_type": "vegan"}"#;

fn local_db_payload() -> SourcePayload {
    let mut record = Map::new();
    record.insert("E No.".to_string(), json!("E211"));
    record.insert("Functional Class".to_string(), json!("Preservative"));
    record.insert("Main Use".to_string(), json!("Preservative for acidic foods"));
    SourcePayload::Record(record)
}

/// 缓存命中后不得触碰数据源与推理服务
#[tokio::test]
async fn test_cache_hit_skips_sources_and_oracle() {
    let _ = tracing_subscriber::fmt::try_init();

    let gauges = Gauges::default();
    let oracle = RecordingOracle::new(INGREDIENT_RESPONSE);
    let cache = Arc::new(IngredientCache::new());

    let mut cached = IngredientProfile::degraded("Sodium Benzoate", "cached profile");
    cached.is_found = true;
    cache.create(cached).unwrap();

    let app = App::with_components(
        Config::default(),
        cache,
        vec![CountingAdapter::new(SourceId::LocalDb, Behavior::Found(local_db_payload()), &gauges)],
        oracle.clone(),
    );

    let profile = app.process_ingredient("sodium benzoate").await.unwrap();

    assert_eq!(profile.name, "Sodium Benzoate");
    assert_eq!(profile.id, 1);
    assert_eq!(gauges.calls.load(Ordering::SeqCst), 0);
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
}

/// 并发上限为 1 时，管线之间串行执行，批次结果保持输入顺序
#[tokio::test]
async fn test_rate_limit_bounds_concurrency_and_order_is_stable() {
    let _ = tracing_subscriber::fmt::try_init();

    let gauges = Gauges::default();
    let oracle = RecordingOracle::new(INGREDIENT_RESPONSE);

    let config = Config {
        parallel_rate_limit: 1,
        ..Config::default()
    };

    let app = App::with_components(
        config,
        Arc::new(IngredientCache::new()),
        vec![CountingAdapter::new(SourceId::LocalDb, Behavior::Found(local_db_payload()), &gauges)],
        oracle,
    );

    let names: Vec<String> = ["Sugar", "Salt", "Sugar"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let outcome = app.process_batch(&names, None).await.unwrap();

    assert_eq!(outcome.ingredients_count, 3);
    assert_eq!(outcome.profiles[0].name, "Sugar");
    assert_eq!(outcome.profiles[1].name, "Salt");
    assert_eq!(outcome.profiles[2].name, "Sugar");
    // 单个许可下各管线的数据源调用不得重叠
    assert!(gauges.max_active.load(Ordering::SeqCst) <= 1);
    // 每个档案的评分都在合法范围
    assert!(outcome
        .profiles
        .iter()
        .all(|p| (1..=10).contains(&p.safety_rating)));
}

/// 部分数据源失败时，提示词只包含命中源的数据，失败源以 "No data found" 出现在摘要里
#[tokio::test]
async fn test_failed_sources_are_isolated() {
    let _ = tracing_subscriber::fmt::try_init();

    let gauges = Gauges::default();
    let oracle = RecordingOracle::new(INGREDIENT_RESPONSE);

    let app = App::with_components(
        Config::default(),
        Arc::new(IngredientCache::new()),
        vec![
            CountingAdapter::new(SourceId::LocalDb, Behavior::Found(local_db_payload()), &gauges),
            CountingAdapter::new(SourceId::Wikipedia, Behavior::Failed, &gauges),
            CountingAdapter::new(SourceId::PubChem, Behavior::NotFound, &gauges),
        ],
        oracle.clone(),
    );

    let profile = app.process_ingredient("Salt").await.unwrap();

    assert!(profile.is_found);
    assert_eq!(profile.safety_rating, 7);
    assert_eq!(profile.source_details.len(), 3);
    assert!(profile.source_details[0].found);
    assert_eq!(profile.source_details[1].summary, "No data found");
    assert_eq!(profile.source_details[2].summary, "No data found");

    let prompts = oracle.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("E No.: E211"));
    assert!(!prompts[0].contains("Wikipedia"));
}

/// 全部数据源未命中时返回默认档案，不消耗推理调用
#[tokio::test]
async fn test_all_sources_missed_returns_default_without_oracle() {
    let _ = tracing_subscriber::fmt::try_init();

    let gauges = Gauges::default();
    let oracle = RecordingOracle::new(INGREDIENT_RESPONSE);

    let app = App::with_components(
        Config::default(),
        Arc::new(IngredientCache::new()),
        vec![
            CountingAdapter::new(SourceId::LocalDb, Behavior::NotFound, &gauges),
            CountingAdapter::new(SourceId::Wikipedia, Behavior::Failed, &gauges),
        ],
        oracle.clone(),
    );

    let profile = app.process_ingredient("Unobtainium").await.unwrap();

    assert!(!profile.is_found);
    assert_eq!(profile.description, DESC_NO_INFO);
    assert_eq!(profile.safety_rating, 5);
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    // 默认档案同样写入缓存，二次请求不再触碰数据源
    let before = gauges.calls.load(Ordering::SeqCst);
    let again = app.process_ingredient("Unobtainium").await.unwrap();
    assert_eq!(again.id, profile.id);
    assert_eq!(gauges.calls.load(Ordering::SeqCst), before);
}

/// 推理服务不可用时，产品分析退回本地计算
#[tokio::test]
async fn test_product_fallback_uses_local_calculation() {
    let _ = tracing_subscriber::fmt::try_init();

    let gauges = Gauges::default();

    let app = App::with_components(
        Config::default(),
        Arc::new(IngredientCache::new()),
        vec![CountingAdapter::new(SourceId::LocalDb, Behavior::Found(local_db_payload()), &gauges)],
        Arc::new(UnavailableOracle),
    );

    let names: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
    let preferences = UserPreferences {
        user_id: None,
        allergies: Some("peanuts".to_string()),
        dietary_restrictions: Some("vegan".to_string()),
    };
    let outcome = app.process_batch(&names, Some(&preferences)).await.unwrap();

    // 推理失败路径下每个成分都是评分 5 的降级档案
    assert_eq!(outcome.analysis.overall_safety_score, 5.0);
    assert!(outcome.analysis.key_takeaway.contains("3 ingredients"));
    assert_eq!(outcome.analysis.suitable_diet_types, DietType::Unknown);
    assert_eq!(
        outcome.analysis.usage_recommendations,
        "Please refer to product packaging for usage guidelines"
    );
    assert_eq!(outcome.ingredient_ids.len(), 3);
    assert!(outcome.ingredient_ids.iter().all(|id| *id > 0));
}
