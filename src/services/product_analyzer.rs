//! 产品分析服务 - 业务能力层
//!
//! 把一批成分档案综合成产品级结论：总体安全评分、饮食适配、
//! 过敏警告、使用建议等。
//!
//! ## 契约
//!
//! - `analyze` 永不失败：推理调用失败或响应不可解析时
//!   退回基于规则的本地计算结果
//! - 无论走哪条路径，结论都回显本批次的成分 ID

use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{
    DietType, HealthInsights, IngredientProfile, ProductAnalysis, UserPreferences,
};
use crate::services::oracle::Oracle;
use crate::services::schema;
use crate::utils::{json_extract, truncate_text};

/// 过敏警告条数上限
const ALLERGY_WARNINGS_MAX: usize = 5;

/// 健康洞察（收益/风险）各自的条数上限
const INSIGHTS_MAX: usize = 3;

/// 产品分析服务
pub struct ProductAnalyzer {
    oracle: Arc<dyn Oracle>,
}

impl ProductAnalyzer {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// 生成产品级分析结论
    pub async fn analyze(
        &self,
        profiles: &[IngredientProfile],
        preferences: Option<&UserPreferences>,
    ) -> ProductAnalysis {
        info!("🧪 开始产品分析，成分数量: {}", profiles.len());

        let ingredient_ids: Vec<i64> = profiles.iter().map(|p| p.id).collect();
        let prompt = build_product_prompt(profiles, preferences);

        let response = match self.oracle.invoke(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("产品分析推理调用失败，退回本地计算: {:#}", e);
                return fallback_analysis(profiles, ingredient_ids);
            }
        };

        match json_extract::extract_object(&response) {
            Ok(analysis) => {
                info!("✅ 产品分析完成");
                let mut allergy_warnings = schema::read_string_list(&analysis, "allergy_warnings");
                allergy_warnings.truncate(ALLERGY_WARNINGS_MAX);
                ProductAnalysis {
                    overall_safety_score: schema::read_score(
                        &analysis,
                        "overall_safety_score",
                        average_safety(profiles),
                    ),
                    suitable_diet_types: schema::read_diet(&analysis, "suitable_diet_types"),
                    allergy_warnings,
                    usage_recommendations: schema::read_string(
                        &analysis,
                        "usage_recommendations",
                        "Please refer to product packaging for usage guidelines",
                    ),
                    health_insights: read_health_insights(&analysis),
                    ingredient_interactions: schema::read_string_list(
                        &analysis,
                        "ingredient_interactions",
                    ),
                    key_takeaway: schema::read_string(
                        &analysis,
                        "key_takeaway",
                        &default_takeaway(profiles),
                    ),
                    ingredient_ids,
                }
            }
            Err(e) => {
                warn!("产品分析响应不可解析，退回本地计算: {}", e);
                fallback_analysis(profiles, ingredient_ids)
            }
        }
    }
}

fn read_health_insights(analysis: &serde_json::Value) -> HealthInsights {
    match analysis.get("health_insights") {
        Some(insights) => {
            let mut benefits = schema::read_string_list(insights, "benefits");
            let mut concerns = schema::read_string_list(insights, "concerns");
            benefits.truncate(INSIGHTS_MAX);
            concerns.truncate(INSIGHTS_MAX);
            HealthInsights { benefits, concerns }
        }
        None => HealthInsights::default(),
    }
}

/// 各成分安全评分的平均值，保留 1 位小数，空批次取中间值
fn average_safety(profiles: &[IngredientProfile]) -> f64 {
    if profiles.is_empty() {
        return 5.0;
    }
    let sum: f64 = profiles.iter().map(|p| p.safety_rating as f64).sum();
    (sum / profiles.len() as f64 * 10.0).round() / 10.0
}

/// 取所有已知成分饮食类型的交集（最严格者）
///
/// Unknown 不参与计算；全部未知时结果为 Unknown
fn diet_intersection(profiles: &[IngredientProfile]) -> DietType {
    let known: Vec<DietType> = profiles
        .iter()
        .map(|p| p.diet_type)
        .filter(|d| *d != DietType::Unknown)
        .collect();

    if known.is_empty() {
        DietType::Unknown
    } else if known.iter().all(|d| *d == DietType::Vegan) {
        DietType::Vegan
    } else if known.iter().all(|d| d.is_vegetarian_friendly()) {
        DietType::Vegetarian
    } else {
        DietType::NonVegetarian
    }
}

/// 合并全部成分的过敏原并去重，保留首次出现顺序
fn collect_allergens(profiles: &[IngredientProfile]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut allergens = Vec::new();
    for profile in profiles {
        for allergen in &profile.allergic_info {
            if seen.insert(allergen.to_lowercase()) {
                allergens.push(allergen.clone());
            }
        }
    }
    allergens
}

fn default_takeaway(profiles: &[IngredientProfile]) -> String {
    format!(
        "Product has {} ingredients with average safety score of {:.1}/10",
        profiles.len(),
        average_safety(profiles)
    )
}

/// 推理不可用时基于规则的本地计算
fn fallback_analysis(profiles: &[IngredientProfile], ingredient_ids: Vec<i64>) -> ProductAnalysis {
    let mut allergy_warnings = collect_allergens(profiles);
    allergy_warnings.truncate(ALLERGY_WARNINGS_MAX);
    ProductAnalysis {
        overall_safety_score: average_safety(profiles),
        suitable_diet_types: diet_intersection(profiles),
        allergy_warnings,
        usage_recommendations: "Please refer to product packaging for usage guidelines".to_string(),
        health_insights: HealthInsights {
            benefits: Vec::new(),
            concerns: vec![
                "Analysis system encountered an error, please check individual ingredients"
                    .to_string(),
            ],
        },
        ingredient_interactions: Vec::new(),
        key_takeaway: default_takeaway(profiles),
        ingredient_ids,
    }
}

/// 构建产品分析提示词
fn build_product_prompt(
    profiles: &[IngredientProfile],
    preferences: Option<&UserPreferences>,
) -> String {
    let mut ingredients_summary = String::new();
    for (i, profile) in profiles.iter().enumerate() {
        let allergic = if profile.allergic_info.is_empty() {
            "None known".to_string()
        } else {
            profile.allergic_info.join(", ")
        };
        let effects = if profile.health_effects.is_empty() {
            "Unknown".to_string()
        } else {
            profile.health_effects.join(", ")
        };
        ingredients_summary.push_str(&format!(
            "\nIngredient {}: {}\nSafety Rating: {}/10\nDiet Type: {}\nAllergic Info: {}\nHealth Effects: {}\nDescription: {}\n",
            i + 1,
            profile.name,
            profile.safety_rating,
            profile.diet_type.label(),
            allergic,
            effects,
            truncate_text(&profile.description, 200)
        ));
    }

    let user_context = match preferences {
        Some(prefs) => format!(
            "\nUser has the following preferences:\n- Dietary Restrictions: {}\n- Allergies: {}\n",
            prefs
                .dietary_restrictions
                .as_deref()
                .unwrap_or("None specified"),
            prefs.allergies.as_deref().unwrap_or("None specified"),
        ),
        None => String::new(),
    };

    format!(
        r#"# PRODUCT INGREDIENT ANALYSIS TASK

You are an expert food scientist and nutritionist analyzing a product's ingredients.
Based on the detailed information about each ingredient below, provide a comprehensive
analysis that would be helpful for a consumer.

## INGREDIENTS INFORMATION:
{ingredients_summary}
{user_context}
## REQUIRED ANALYSIS:
1. Overall Safety Score (1-10): Calculate this based on individual ingredient safety scores
2. Suitable Diet Types: Determine if this product is suitable for vegans, vegetarians, etc.
3. Allergy Warnings: Flag any potential allergens present
4. Usage Recommendations: Provide safe consumption limits or usage guidance
5. Health Insights: Summarize health benefits and concerns
6. Ingredient Interactions: Note any ingredients that may interact when combined
7. Key Takeaway: A single sentence summarizing if this product is recommended

## FORMAT YOUR RESPONSE AS JSON:
{{
  "overall_safety_score": (number between 1-10),
  "suitable_diet_types": (string from vegan,vegetarian,non-vegetarian,unknown),
  "allergy_warnings": (array of strings),
  "usage_recommendations": (string with specific guidance),
  "health_insights": {{
    "benefits": (array of strings),
    "concerns": (array of strings)
  }},
  "ingredient_interactions": (array of strings),
  "key_takeaway": (string)
}}

Only include factual information based on the provided data. If information is unavailable
for any field, use appropriate default values."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FailingOracle;

    #[async_trait]
    impl Oracle for FailingOracle {
        async fn invoke(&self, _prompt: &str) -> anyhow::Result<String> {
            anyhow::bail!("unavailable")
        }
    }

    fn profile(name: &str, rating: u8, diet: DietType, allergens: &[&str]) -> IngredientProfile {
        let mut p = IngredientProfile::degraded(name, "test");
        p.is_found = true;
        p.safety_rating = rating;
        p.diet_type = diet;
        p.allergic_info = allergens.iter().map(|s| s.to_string()).collect();
        p
    }

    #[test]
    fn test_average_safety_rounds_one_decimal() {
        let profiles = vec![
            profile("a", 8, DietType::Vegan, &[]),
            profile("b", 6, DietType::Vegan, &[]),
            profile("c", 4, DietType::Vegan, &[]),
        ];
        assert_eq!(average_safety(&profiles), 6.0);

        let profiles = vec![
            profile("a", 7, DietType::Vegan, &[]),
            profile("b", 8, DietType::Vegan, &[]),
            profile("c", 8, DietType::Vegan, &[]),
        ];
        assert_eq!(average_safety(&profiles), 7.7);

        assert_eq!(average_safety(&[]), 5.0);
    }

    #[test]
    fn test_diet_intersection_strictest_wins() {
        let all_vegan = vec![
            profile("a", 5, DietType::Vegan, &[]),
            profile("b", 5, DietType::Vegan, &[]),
        ];
        assert_eq!(diet_intersection(&all_vegan), DietType::Vegan);

        let mixed_veg = vec![
            profile("a", 5, DietType::Vegan, &[]),
            profile("b", 5, DietType::Vegetarian, &[]),
        ];
        assert_eq!(diet_intersection(&mixed_veg), DietType::Vegetarian);

        let with_meat = vec![
            profile("a", 5, DietType::Vegan, &[]),
            profile("b", 5, DietType::NonVegetarian, &[]),
        ];
        assert_eq!(diet_intersection(&with_meat), DietType::NonVegetarian);

        // Unknown 不参与计算
        let with_unknown = vec![
            profile("a", 5, DietType::Vegan, &[]),
            profile("b", 5, DietType::Unknown, &[]),
        ];
        assert_eq!(diet_intersection(&with_unknown), DietType::Vegan);

        let all_unknown = vec![profile("a", 5, DietType::Unknown, &[])];
        assert_eq!(diet_intersection(&all_unknown), DietType::Unknown);
    }

    #[test]
    fn test_collect_allergens_dedupes_in_order() {
        let profiles = vec![
            profile("a", 5, DietType::Vegan, &["soy", "gluten"]),
            profile("b", 5, DietType::Vegan, &["Soy", "milk"]),
        ];
        assert_eq!(collect_allergens(&profiles), vec!["soy", "gluten", "milk"]);
    }

    #[tokio::test]
    async fn test_oracle_failure_falls_back_to_local_calculation() {
        let analyzer = ProductAnalyzer::new(Arc::new(FailingOracle));
        let profiles = vec![
            profile("a", 8, DietType::Vegan, &["soy"]),
            profile("b", 6, DietType::Vegan, &[]),
            profile("c", 4, DietType::Vegetarian, &[]),
        ];

        let analysis = analyzer.analyze(&profiles, None).await;

        assert_eq!(analysis.overall_safety_score, 6.0);
        assert_eq!(analysis.suitable_diet_types, DietType::Vegetarian);
        assert_eq!(analysis.allergy_warnings, vec!["soy"]);
        assert!(analysis.key_takeaway.contains("3 ingredients"));
        assert!(analysis.key_takeaway.contains("6.0/10"));
        assert_eq!(
            analysis.usage_recommendations,
            "Please refer to product packaging for usage guidelines"
        );
    }

    /// 解析路径下的列表字段被截断到上限
    #[tokio::test]
    async fn test_parsed_lists_are_capped() {
        struct FixedOracle;

        #[async_trait]
        impl Oracle for FixedOracle {
            async fn invoke(&self, _prompt: &str) -> anyhow::Result<String> {
                Ok(r#"{"overall_safety_score": 7.5,
                    "suitable_diet_types": "vegan",
                    "allergy_warnings": ["a","b","c","d","e","f","g"],
                    "usage_recommendations": "Use in moderation",
                    "health_insights": {"benefits": ["1","2","3","4"], "concerns": []},
                    "ingredient_interactions": [],
                    "key_takeaway": "Fine."}"#
                    .to_string())
            }
        }

        let analyzer = ProductAnalyzer::new(Arc::new(FixedOracle));
        let profiles = vec![profile("a", 7, DietType::Vegan, &[])];

        let analysis = analyzer.analyze(&profiles, None).await;

        assert_eq!(analysis.overall_safety_score, 7.5);
        assert_eq!(analysis.suitable_diet_types, DietType::Vegan);
        assert_eq!(analysis.allergy_warnings.len(), 5);
        assert_eq!(analysis.health_insights.benefits.len(), 3);
        assert_eq!(analysis.key_takeaway, "Fine.");
    }

    #[test]
    fn test_prompt_includes_preferences() {
        let profiles = vec![profile("Sugar", 6, DietType::Vegan, &[])];
        let prefs = UserPreferences {
            user_id: None,
            allergies: Some("peanuts".to_string()),
            dietary_restrictions: Some("vegan".to_string()),
        };
        let prompt = build_product_prompt(&profiles, Some(&prefs));
        assert!(prompt.contains("Ingredient 1: Sugar"));
        assert!(prompt.contains("Allergies: peanuts"));
        assert!(prompt.contains("Dietary Restrictions: vegan"));

        let prompt = build_product_prompt(&profiles, None);
        assert!(!prompt.contains("User has the following preferences"));
    }
}
