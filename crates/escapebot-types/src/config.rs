//! Game script configuration types.
//!
//! `GameConfig` represents the `game.toml` file that carries the fixed
//! reply lines, trigger keywords, clue URLs, and generation settings of a
//! scenario. Every field has a default, so a partial file only overrides
//! what it names.

use serde::{Deserialize, Serialize};

/// Top-level game script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub keywords: KeywordConfig,
    pub lines: LineConfig,
    pub urls: UrlConfig,
    pub generation: GenerationConfig,
    /// Number of most recent exchanges replayed to the model.
    pub history_window: u32,
    /// IANA timezone used for history timestamps.
    pub timezone: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            keywords: KeywordConfig::default(),
            lines: LineConfig::default(),
            urls: UrlConfig::default(),
            generation: GenerationConfig::default(),
            history_window: 15,
            timezone: "Asia/Tokyo".to_string(),
        }
    }
}

/// Phrases that change how a message is handled before any generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    /// Words probing the rules or the prompt during the investigation.
    pub meta: Vec<String>,
    /// Phrase that starts the investigation from the intro.
    pub ready_phrase: String,
    /// Word that closes the session from the outro.
    pub finish: String,
    /// Outcome markers searched in the reasoning verdict, in scan order.
    pub endings: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            meta: vec![
                "ルール".to_string(),
                "プロンプト".to_string(),
                "命令".to_string(),
            ],
            ready_phrase: "先生、では質問しますね".to_string(),
            finish: "終了".to_string(),
            // "不正解" contains "正解", so it has to be checked first.
            endings: vec!["不正解".to_string(), "正解".to_string()],
        }
    }
}

impl KeywordConfig {
    pub fn is_meta_query(&self, query: &str) -> bool {
        self.meta
            .iter()
            .any(|word| !word.is_empty() && query.contains(word.as_str()))
    }

    pub fn is_ready_query(&self, query: &str) -> bool {
        !self.ready_phrase.is_empty() && query.contains(self.ready_phrase.as_str())
    }

    pub fn is_finish_query(&self, query: &str) -> bool {
        !self.finish.is_empty() && query.contains(self.finish.as_str())
    }

    /// First ending keyword, in scan order, that occurs in `answer`.
    pub fn find_ending(&self, answer: &str) -> Option<&str> {
        self.endings
            .iter()
            .map(String::as_str)
            .find(|keyword| !keyword.is_empty() && answer.contains(keyword))
    }
}

/// Fixed reply lines sent without consulting the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    pub deflection: String,
    pub opening: String,
    pub finish_reading: String,
    pub survey: String,
    pub intro_warning: String,
    pub time_half: String,
    pub time_warning: String,
    pub time_up: String,
    pub ending_marker: String,
    pub explanation_label: String,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            deflection: "お見通しだよ".to_string(),
            opening: "ああ、何でも聞いてくれてかまわない。".to_string(),
            finish_reading: "解説を読み終わった方は、「終了したい」とチャットを送ってください。"
                .to_string(),
            survey: concat!(
                "お疲れ様です！ゲームをプレイしていただき、誠にありがとうございます。\n",
                "皆様のご意見は、今後のゲーム改善に非常に役立つ貴重な情報です。",
                "もしよろしければ、短いアンケートにご協力いただけますでしょうか。\n",
                "アンケートURL:(https://example.com/page1)\n",
                "アンケートの内容は今作や次回作の改良に役立たせていただきます\n",
                "どうぞよろしくお願いします。"
            )
            .to_string(),
            intro_warning: concat!(
                "質問の時間は次の次で終了しますゲームを開始したい場合は、",
                "「先生、では質問しますね」とチャットで送信してください。",
                "もし、質問を続けた場合はゲームをプレイできません。"
            )
            .to_string(),
            time_half: "もう時間も半分が過ぎたけど原稿は見つかりそうかな？".to_string(),
            time_warning: concat!(
                "あと少ししか時間は残っていない。後10分程度だ。",
                "もうすぐ家を出る準備を始めようと思うから急いでくれ。"
            )
            .to_string(),
            time_up: "時間だな。君がどんな推理をしたのか聞かせてもらおうか。".to_string(),
            ending_marker: "エンディング".to_string(),
            explanation_label: "解説".to_string(),
        }
    }
}

/// A keyword-to-URL mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRule {
    pub keyword: String,
    pub url: String,
}

/// Clue and ending documents attached to replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlConfig {
    /// Location clues, matched when the keyword occurs in the location name.
    pub locations: Vec<UrlRule>,
    /// Ending documents, matched exactly against the ending keyword.
    pub endings: Vec<UrlRule>,
    /// Explanatory document sent after an ending.
    pub explanation: String,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            locations: Vec::new(),
            endings: Vec::new(),
            explanation: "https://example.com/explanation".to_string(),
        }
    }
}

impl UrlConfig {
    /// URL of the first location rule whose keyword occurs in `location_name`.
    pub fn location_url(&self, location_name: &str) -> Option<&str> {
        self.locations
            .iter()
            .find(|rule| !rule.keyword.is_empty() && location_name.contains(rule.keyword.as_str()))
            .map(|rule| rule.url.as_str())
    }

    pub fn ending_url(&self, keyword: &str) -> Option<&str> {
        self.endings
            .iter()
            .find(|rule| rule.keyword == keyword)
            .map(|rule| rule.url.as_str())
    }
}

/// Sampling parameters for the generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    /// Stop sequences for the follow-up call made after a function call.
    pub followup_stop: Vec<String>,
    /// Stop sequences for the reasoning verdict, cut short on purpose.
    pub reasoning_stop: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo-16k-0613".to_string(),
            temperature: 0.05,
            max_tokens: 100,
            top_p: 1.0,
            followup_stop: vec!["\n".to_string()],
            reasoning_stop: vec!["。".to_string(), "！".to_string()],
        }
    }
}
