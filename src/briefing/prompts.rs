//! Prompt Templates
//!
//! Per-section prompt builders. The product targets Japanese-speaking
//! users, so the templates are written in Japanese; each one pins the
//! record count, the exact JSON shape and the no-prose rule the parser
//! depends on.

pub const PHRASE_COUNT: usize = 5;
pub const TRIVIA_COUNT: usize = 5;
pub const GLOSSARY_COUNT: usize = 8;
pub const KEY_PERSON_COUNT: usize = 5;
pub const REMARK_COUNT: usize = 6;

/// Shared system instruction for the first-stage section requests.
pub const SECTION_SYSTEM: &str = "あなたは指定されたキーワードについて正確で具体的な情報を日本語で提供するリサーチアシスタントです。出力は指示されたJSONフォーマットに厳密に従い、JSON以外のテキストを含めないでください。";

pub fn phrases_prompt(topic: &str) -> String {
    format!(
        r#"キーワード「{topic}」について、マニアやクライアントから「こいつわかってるな」「お、そんなことまで知ってるんだ」「君、賢いね」と思わせるような、短くて知り合いに話すようなセリフを{PHRASE_COUNT}つ生成してください。各セリフには素人にもわかる詳しい200文字以上の背景説明と内容に応じた推奨度を付けてください。

セリフの中で重要なキーワードや専門用語や大事なポイントには<keyword>タグを付けてください。例: <keyword>重要な用語</keyword>
背景説明には<keyword>タグを使用しないでください。

以下の4つのタグを当てはまる場合にのみ付けてください：
- トレンド：最新の動向や流行を示す情報
- 問題提起：業界や分野における課題や問題点を指摘する情報
- 競合情報：{topic}の競合他社や競合製品に関する洞察
- 表彰・称賛：業界内での評価や成果に関する情報

これらのタグに関連する情報を含むセリフを優先的に生成してください。

以下のJSONフォーマットで出力してください。正しいJSONのみを返し、追加の説明やコメントや改行や制御文字は含めないでください。

{{
  "phrases": [
    {{
      "quote": "セリフ1（<keyword>タグ付き）",
      "background": "背景説明1（タグなし）",
      "rating": 5,
      "tags": ["トレンド", "競合情報"]
    }},
    {{
      "quote": "セリフ2（<keyword>タグ付き）",
      "background": "背景説明2（タグなし）",
      "rating": 4.5,
      "tags": ["問題提起"]
    }}
  ]
}}
"#
    )
}

pub fn trivia_prompt(topic: &str) -> String {
    format!(
        r#"キーワード「{topic}」について、話のネタになる意外な豆知識やトリビアを{TRIVIA_COUNT}つ生成してください。それぞれ聞いた人が「へえ、そうなんだ」と言いたくなる、会話でそのまま使える内容にしてください。
豆知識の中で重要なキーワードや専門用語には<keyword>タグを付けてください。例: <keyword>重要な用語</keyword>

以下のJSONフォーマットで出力してください。正しいJSONのみを返し、追加の説明やコメントや改行や制御文字は含めないでください。

{{
  "trivia": [
    {{
      "content": "豆知識1（<keyword>タグ付き）"
    }},
    {{
      "content": "豆知識2（<keyword>タグ付き）"
    }}
  ]
}}
"#
    )
}

pub fn glossary_prompt(topic: &str) -> String {
    format!(
        r#"キーワード「{topic}」に関連する{GLOSSARY_COUNT}つの重要な用語（人物名は含めないでください）とその素人にもわかる詳しい100文字以上の説明を生成してください。
以下のJSONフォーマットで出力してください。正しいJSONのみを返し、追加の説明やコメントや改行や制御文字は含めないでください。

{{
  "glossary": [
    {{
      "term": "用語1",
      "definition": "定義1"
    }},
    {{
      "term": "用語2",
      "definition": "定義2"
    }}
  ]
}}
"#
    )
}

pub fn key_persons_prompt(topic: &str) -> String {
    format!(
        r#"キーワード「{topic}」に関連する重要な人物を{KEY_PERSON_COUNT}人選び、その人物の名前、素人にもわかる詳しい100文字以上の説明、TwitterとLinkedInのURL、公式ウェブサイトのURLを生成してください。
以下のJSONフォーマットで出力してください。正しいJSONのみを返し、追加の説明やコメントや改行や制御文字は含めないでください。

{{
  "keyPersons": [
    {{
      "name": "人物名1",
      "description": "人物の説明1",
      "twitter": "https://twitter.com/example1",
      "linkedin": "https://www.linkedin.com/in/example1",
      "website": "https://example1.com"
    }},
    {{
      "name": "人物名2",
      "description": "人物の説明2",
      "twitter": "https://twitter.com/example2",
      "linkedin": "https://www.linkedin.com/in/example2",
      "website": "https://example2.com"
    }}
  ]
}}
"#
    )
}

/// Second-stage prompt: condense the collected sections into short
/// remarks a user could drop into conversation. The response is a bare
/// JSON array, not an object.
pub fn synthesis_prompt(topic: &str, context: &str) -> String {
    format!(
        r#"以下は「{topic}」について収集した情報です。

{context}

この情報をもとに、知人との会話でさらっと言うと「こいつわかってるな」と思わせる「{topic}」についての一言を{REMARK_COUNT}つ生成してください。各一言は100文字以内の自然な話し言葉で、「そういえば」「ちなみに」「実は」などの前置きで始めてください。「{topic}」や重要な用語には<keyword>タグを付けてください。例: <keyword>{topic}</keyword>

以下のJSONフォーマットで出力してください。正しいJSON配列のみを返し、追加の説明やコメントや改行や制御文字は含めないでください。

[
  {{ "content": "一言1（<keyword>タグ付き）" }},
  {{ "content": "一言2（<keyword>タグ付き）" }}
]
"#
    )
}
