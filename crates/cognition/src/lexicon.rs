//! Lexicon - 静态词表与模式表
//!
//! 职责：
//! - 停用词、情感词、流行语词表
//! - 分类 → 关键词表
//! - 情感/绝对时间/近期时间三组正则模式
//!
//! 设计原则：
//! - 纯数据，构造时加载一次，之后只读
//! - 测试可以用 `Lexicon::builder()` 替换为更小的表

use regex::Regex;
use std::collections::{BTreeSet, HashSet};

/// 情感极性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
    /// 年轻人流行语，需要结合上下文判断
    Ambiguous,
}

/// 流行语条目（带默认极性，范围 [-1, 1]）
#[derive(Debug, Clone)]
struct SlangEntry {
    word: String,
    default_polarity: f64,
}

/// 词表
#[derive(Debug, Clone)]
pub struct Lexicon {
    stopwords: HashSet<String>,
    positive: Vec<String>,
    negative: Vec<String>,
    youth_slang: Vec<SlangEntry>,
    internet_slang: Vec<String>,
    positive_cues: Vec<String>,
    negative_cues: Vec<String>,
    fallback_positive: Vec<String>,
    fallback_negative: Vec<String>,
    emotional_categories: HashSet<String>,
    categories: Vec<(String, Vec<String>)>,
    emotional_patterns: Vec<Regex>,
    time_patterns: Vec<Regex>,
    recent_patterns: Vec<Regex>,
    extra_words: Vec<(String, String)>,
}

/// 词表构建器
#[derive(Debug, Default, Clone)]
pub struct LexiconBuilder {
    stopwords: Vec<String>,
    positive: Vec<String>,
    negative: Vec<String>,
    youth_slang: Vec<(String, f64)>,
    internet_slang: Vec<String>,
    positive_cues: Vec<String>,
    negative_cues: Vec<String>,
    fallback_positive: Vec<String>,
    fallback_negative: Vec<String>,
    emotional_categories: Vec<String>,
    categories: Vec<(String, Vec<String>)>,
    emotional_patterns: Vec<String>,
    time_patterns: Vec<String>,
    recent_patterns: Vec<String>,
    extra_words: Vec<(String, String)>,
}

fn owned<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().to_lowercase())
        .collect()
}

impl LexiconBuilder {
    pub fn stopwords<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, words: I) -> Self {
        self.stopwords.extend(owned(words));
        self
    }

    pub fn positive<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, words: I) -> Self {
        self.positive.extend(owned(words));
        self
    }

    pub fn negative<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, words: I) -> Self {
        self.negative.extend(owned(words));
        self
    }

    /// 流行语及其默认极性
    pub fn youth_slang<I: IntoIterator<Item = (S, f64)>, S: AsRef<str>>(
        mut self,
        words: I,
    ) -> Self {
        self.youth_slang.extend(
            words
                .into_iter()
                .map(|(w, p)| (w.as_ref().to_lowercase(), p.clamp(-1.0, 1.0))),
        );
        self
    }

    pub fn internet_slang<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, words: I) -> Self {
        self.internet_slang.extend(owned(words));
        self
    }

    /// 流行语上下文中的正/负向提示字
    pub fn context_cues<I, J, S, T>(mut self, positive: I, negative: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        self.positive_cues.extend(owned(positive));
        self.negative_cues.extend(owned(negative));
        self
    }

    /// 没有情感词时使用的极性短语
    pub fn polarity_phrases<I, J, S, T>(mut self, positive: I, negative: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        self.fallback_positive.extend(owned(positive));
        self.fallback_negative.extend(owned(negative));
        self
    }

    pub fn emotional_categories<I: IntoIterator<Item = S>, S: AsRef<str>>(
        mut self,
        names: I,
    ) -> Self {
        self.emotional_categories
            .extend(names.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn category<I: IntoIterator<Item = S>, S: AsRef<str>>(
        mut self,
        name: &str,
        keywords: I,
    ) -> Self {
        self.categories.push((name.to_string(), owned(keywords)));
        self
    }

    pub fn emotional_patterns<I: IntoIterator<Item = S>, S: AsRef<str>>(
        mut self,
        patterns: I,
    ) -> Self {
        self.emotional_patterns
            .extend(patterns.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn time_patterns<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, patterns: I) -> Self {
        self.time_patterns
            .extend(patterns.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn recent_patterns<I: IntoIterator<Item = S>, S: AsRef<str>>(
        mut self,
        patterns: I,
    ) -> Self {
        self.recent_patterns
            .extend(patterns.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// 只用于分词词典的额外词（词, 词性）
    pub fn dictionary_words<I: IntoIterator<Item = (S, T)>, S: AsRef<str>, T: AsRef<str>>(
        mut self,
        words: I,
    ) -> Self {
        self.extra_words.extend(
            words
                .into_iter()
                .map(|(w, t)| (w.as_ref().to_lowercase(), t.as_ref().to_string())),
        );
        self
    }

    pub fn build(self) -> Result<Lexicon, regex::Error> {
        Ok(Lexicon {
            stopwords: self.stopwords.into_iter().collect(),
            positive: self.positive,
            negative: self.negative,
            youth_slang: self
                .youth_slang
                .into_iter()
                .map(|(word, default_polarity)| SlangEntry {
                    word,
                    default_polarity,
                })
                .collect(),
            internet_slang: self.internet_slang,
            positive_cues: self.positive_cues,
            negative_cues: self.negative_cues,
            fallback_positive: self.fallback_positive,
            fallback_negative: self.fallback_negative,
            emotional_categories: self.emotional_categories.into_iter().collect(),
            categories: self.categories,
            emotional_patterns: compile(&self.emotional_patterns)?,
            time_patterns: compile(&self.time_patterns)?,
            recent_patterns: compile(&self.recent_patterns)?,
            extra_words: self.extra_words,
        })
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|p| Regex::new(p)).collect()
}

impl Lexicon {
    pub fn builder() -> LexiconBuilder {
        LexiconBuilder::default()
    }

    /// 内置中英文词表
    pub fn builtin() -> Self {
        let time_words = alternation(TIME_WORDS);
        let recent_words = alternation(RECENT_WORDS);

        let mut builder = Self::builder()
            .stopwords(STOPWORDS)
            .positive(POSITIVE_WORDS)
            .negative(NEGATIVE_WORDS)
            .youth_slang(YOUTH_SLANG.iter().copied())
            .internet_slang(INTERNET_SLANG)
            .context_cues(POSITIVE_CUES, NEGATIVE_CUES)
            .polarity_phrases(FALLBACK_POSITIVE, FALLBACK_NEGATIVE)
            .emotional_categories(EMOTIONAL_CATEGORIES)
            .emotional_patterns(EMOTIONAL_PATTERNS)
            .time_patterns([time_words.as_str()])
            .time_patterns(TIME_PATTERNS)
            .recent_patterns([recent_words.as_str()])
            .recent_patterns(RECENT_PATTERNS)
            .dictionary_words(TIME_WORDS.iter().map(|w| (*w, "t")))
            .dictionary_words(RECENT_WORDS.iter().map(|w| (*w, "t")))
            .dictionary_words(COMMON_WORDS.iter().copied());

        for (name, keywords) in CATEGORY_TABLE {
            builder = builder.category(name, keywords.iter());
        }

        match builder.build() {
            Ok(lexicon) => lexicon,
            // 内置模式在测试中全部编译通过
            Err(e) => unreachable!("builtin lexicon patterns must compile: {e}"),
        }
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    /// 情感词表（正向/负向/流行语）中的词
    pub fn is_emotional_word(&self, word: &str) -> bool {
        self.polarity(word).is_some()
    }

    /// 网络流行语或年轻人流行语
    pub fn is_slang_word(&self, word: &str) -> bool {
        self.internet_slang.iter().any(|w| w == word)
            || self.youth_slang.iter().any(|s| s.word == word)
    }

    pub fn polarity(&self, word: &str) -> Option<Polarity> {
        if self.positive.iter().any(|w| w == word) {
            Some(Polarity::Positive)
        } else if self.negative.iter().any(|w| w == word) {
            Some(Polarity::Negative)
        } else if self.youth_slang.iter().any(|s| s.word == word) {
            Some(Polarity::Ambiguous)
        } else {
            None
        }
    }

    /// 流行语的默认极性
    pub fn slang_default_polarity(&self, word: &str) -> f64 {
        self.youth_slang
            .iter()
            .find(|s| s.word == word)
            .map_or(0.0, |s| s.default_polarity)
    }

    pub fn positive_cues(&self) -> &[String] {
        &self.positive_cues
    }

    pub fn negative_cues(&self) -> &[String] {
        &self.negative_cues
    }

    /// 兜底极性短语判定：1 正向，-1 负向，0 无
    pub fn phrase_polarity(&self, text: &str) -> i8 {
        if self.fallback_positive.iter().any(|p| contains_term(text, p)) {
            1
        } else if self.fallback_negative.iter().any(|p| contains_term(text, p)) {
            -1
        } else {
            0
        }
    }

    /// 文本中出现的情感词（按词表顺序，去掉被更长命中覆盖的词）
    pub fn emotional_hits(&self, text: &str) -> Vec<String> {
        let candidates = self
            .positive
            .iter()
            .chain(self.negative.iter())
            .chain(self.youth_slang.iter().map(|s| &s.word));
        longest_hits(text, candidates)
    }

    /// 文本中出现的网络流行语
    pub fn slang_hits(&self, text: &str) -> Vec<String> {
        longest_hits(text, self.internet_slang.iter())
    }

    pub fn is_emotional_category(&self, category: &str) -> bool {
        self.emotional_categories.contains(category)
    }

    /// 分类预测：关键词或原文命中分类词表即计入
    pub fn categorize(&self, text: &str, keywords: &[String]) -> BTreeSet<String> {
        self.categories
            .iter()
            .filter(|(_, words)| {
                words.iter().any(|w| {
                    keywords.iter().any(|k| k == w) || contains_term(text, w)
                })
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn matches_emotional_pattern(&self, text: &str) -> bool {
        self.emotional_patterns.iter().any(|p| p.is_match(text))
    }

    pub fn matches_time_reference(&self, text: &str) -> bool {
        self.time_patterns.iter().any(|p| p.is_match(text))
    }

    pub fn matches_recent_reference(&self, text: &str) -> bool {
        self.recent_patterns.iter().any(|p| p.is_match(text))
    }

    /// 分词词典条目（词, 词性）
    pub fn dictionary_entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = Vec::new();
        for (_, words) in &self.categories {
            entries.extend(words.iter().map(|w| (w.clone(), "n".to_string())));
        }
        entries.extend(self.positive.iter().map(|w| (w.clone(), "a".to_string())));
        entries.extend(self.negative.iter().map(|w| (w.clone(), "a".to_string())));
        entries.extend(self.youth_slang.iter().map(|s| (s.word.clone(), "i".to_string())));
        entries.extend(self.internet_slang.iter().map(|w| (w.clone(), "i".to_string())));
        entries.extend(self.stopwords.iter().map(|w| (w.clone(), "u".to_string())));
        entries.extend(self.extra_words.iter().cloned());
        entries
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

/// 子串包含判定：ASCII 词要求词边界，CJK 词直接按子串
pub fn contains_term(text: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    if !term.is_ascii() {
        return text.contains(term);
    }
    text.match_indices(term).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + term.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphanumeric())
            && !after.is_some_and(|c| c.is_ascii_alphanumeric())
    })
}

fn longest_hits<'a, I>(text: &str, candidates: I) -> Vec<String>
where
    I: Iterator<Item = &'a String>,
{
    let mut hits: Vec<String> = Vec::new();
    for word in candidates {
        if contains_term(text, word) && !hits.contains(word) {
            hits.push(word.clone());
        }
    }
    // "不开心" 命中时不再计入 "开心"
    let covered: Vec<bool> = hits
        .iter()
        .map(|h| {
            hits.iter()
                .any(|other| other != h && other.contains(h.as_str()))
        })
        .collect();
    hits.into_iter()
        .zip(covered)
        .filter(|(_, covered)| !covered)
        .map(|(h, _)| h)
        .collect()
}

fn alternation(words: &[&str]) -> String {
    let escaped: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    format!("(?:{})", escaped.join("|"))
}

const STOPWORDS: &[&str] = &[
    "的", "了", "是", "在", "我", "你", "他", "她", "它", "我们", "你们", "他们", "这", "那",
    "就", "都", "也", "还", "和", "跟", "与", "吗", "呢", "吧", "啊", "呀", "哦", "嗯", "着",
    "过", "很", "好", "有", "没有", "一个", "什么", "怎么", "这个", "那个", "因为", "所以",
    "但是", "然后", "可以", "就是", "自己", "不是", "还是", "一下", "the", "a", "an", "is",
    "are", "was", "were", "i", "you", "he", "she", "it", "we", "they", "to", "of", "and", "or",
    "in", "on", "at", "for", "with", "my", "your", "me", "do", "did", "be", "this", "that",
];

const POSITIVE_WORDS: &[&str] = &[
    "开心", "高兴", "快乐", "幸福", "喜欢", "满意", "兴奋", "期待", "感动", "温暖", "放松",
    "轻松", "自豪", "欣慰", "感谢", "谢谢", "好棒", "真棒", "厉害", "顺利", "成功", "happy",
    "glad", "love", "great", "awesome", "excited", "thanks", "relaxed",
];

const NEGATIVE_WORDS: &[&str] = &[
    "难过", "伤心", "焦虑", "抑郁", "痛苦", "失望", "生气", "愤怒", "害怕", "担心", "紧张",
    "孤独", "委屈", "崩溃", "烦躁", "心烦", "压抑", "沮丧", "后悔", "疲惫", "不开心", "难受",
    "绝望", "sad", "angry", "anxious", "depressed", "lonely", "upset", "worried", "stressed",
];

const YOUTH_SLANG: &[(&str, f64)] = &[
    ("绝了", 1.0),
    ("离谱", -1.0),
    ("无语", -1.0),
    ("破防", -1.0),
    ("emo", -1.0),
    ("笑死", 1.0),
    ("上头", 1.0),
    ("真香", 1.0),
    ("麻了", -1.0),
    ("裂开", -1.0),
    ("yyds", 1.0),
    ("awsl", 1.0),
    ("爷青回", 1.0),
    ("栓q", -1.0),
];

const INTERNET_SLANG: &[&str] = &[
    "yyds", "绝绝子", "破防", "emo", "躺平", "内卷", "摆烂", "打工人", "社死", "awsl", "xswl",
    "芭比q", "栓q", "凡尔赛", "柠檬精", "干饭", "种草", "拔草", "一整个", "真香",
];

const POSITIVE_CUES: &[&str] = &["开心", "哈哈", "棒", "爱", "喜欢", "厉害", "牛", "赞"];

const FALLBACK_POSITIVE: &[&str] = &["谢谢", "感谢", "太好了", "不错", "thanks", "thank you", "great"];

const FALLBACK_NEGATIVE: &[&str] = &["糟糕", "太差", "不好", "bad", "terrible"];

const NEGATIVE_CUES: &[&str] = &["不", "没", "烦", "难", "气", "累", "差", "哭", "崩"];

const EMOTIONAL_CATEGORIES: &[&str] = &["情感关系", "家庭生活", "健康医疗"];

const CATEGORY_TABLE: &[(&str, &[&str])] = &[
    (
        "工作学习",
        &[
            "工作", "上班", "加班", "老板", "同事", "项目", "会议", "领导", "辞职", "面试", "工资",
            "升职", "职场", "客户", "学习", "考试", "作业", "老师", "学校", "论文", "复习", "考研",
            "毕业", "job", "work", "boss", "meeting", "exam", "office", "deadline",
        ],
    ),
    (
        "情感关系",
        &[
            "恋爱", "男朋友", "女朋友", "对象", "分手", "表白", "约会", "结婚", "暧昧", "吵架",
            "前任", "朋友", "闺蜜", "感情", "异地", "dating", "boyfriend", "girlfriend",
            "relationship",
        ],
    ),
    (
        "健康医疗",
        &[
            "身体", "生病", "医院", "医生", "感冒", "发烧", "头疼", "头痛", "失眠", "焦虑", "抑郁",
            "压力", "心理", "吃药", "体检", "睡眠", "健康", "咳嗽", "doctor", "hospital", "sick",
            "health", "anxiety", "insomnia",
        ],
    ),
    (
        "家庭生活",
        &[
            "爸爸", "妈妈", "父母", "家人", "孩子", "老公", "老婆", "家里", "回家", "亲戚", "爷爷",
            "奶奶", "宝宝", "family", "parents", "mom", "dad",
        ],
    ),
    (
        "兴趣爱好",
        &[
            "游戏", "电影", "音乐", "动漫", "看书", "小说", "旅游", "旅行", "画画", "追剧", "运动",
            "健身", "篮球", "足球", "跑步", "摄影", "唱歌", "爱好", "game", "movie", "music",
            "travel", "hobby",
        ],
    ),
    (
        "日常生活",
        &[
            "吃饭", "做饭", "外卖", "天气", "购物", "睡觉", "起床", "快递", "打扫", "搬家", "早餐",
            "午饭", "晚饭", "weather", "shopping", "dinner", "lunch",
        ],
    ),
    (
        "财务理财",
        &[
            "存钱", "存款", "理财", "股票", "基金", "房贷", "花钱", "省钱", "买房", "投资", "信用卡",
            "借钱", "预算", "money", "salary", "stock", "invest", "budget",
        ],
    ),
];

const EMOTIONAL_PATTERNS: &[&str] = &[
    r"(喜欢|爱|想念|思念|讨厌|恨)(你|他|她|我)",
    r"(男朋友|女朋友|对象|老公|老婆|前任|暗恋|分手|表白|吵架|冷战)",
    r"(心情|情绪|心里|感觉)(不好|很差|低落|很糟|难受|好差|不太好)",
    r"(好|很|太|超|有点|特别|非常)(难过|伤心|焦虑|烦|累|孤独|委屈|开心|崩溃|害怕|紧张)",
    r"\bi (feel|felt|am feeling)\b",
    r"\b(miss|love|hate) (you|him|her)\b",
    r"\b(break ?up|broke up)\b",
];

const TIME_WORDS: &[&str] = &[
    "昨天", "今天", "明天", "前天", "后天", "上周", "下周", "这周", "本周", "上个月", "下个月",
    "这个月", "去年", "今年", "明年", "早上", "晚上", "中午", "周末",
];

const TIME_PATTERNS: &[&str] = &[
    r"(周|星期|礼拜)[一二三四五六日天]",
    r"\d+\s*(月|号|日|点|年)",
    r"[一二三四五六七八九十]+(月|号)",
    r"\b(yesterday|today|tomorrow|tonight|last (week|month|year)|next (week|month)|monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
];

const RECENT_WORDS: &[&str] = &[
    "最近", "近来", "近期", "这几天", "这两天", "这阵子", "这段时间", "前几天", "前两天", "上次",
    "上回", "刚才", "刚刚", "之前", "那次", "前阵子",
];

const RECENT_PATTERNS: &[&str] =
    &[r"\b(recently|lately|last time|the other day|a while ago|earlier)\b"];

/// 常见专名与普通词（只用于分词）
const COMMON_WORDS: &[(&str, &str)] = &[
    ("北京", "ns"),
    ("上海", "ns"),
    ("广州", "ns"),
    ("深圳", "ns"),
    ("杭州", "ns"),
    ("成都", "ns"),
    ("南京", "ns"),
    ("武汉", "ns"),
    ("西安", "ns"),
    ("重庆", "ns"),
    ("日本", "ns"),
    ("美国", "ns"),
    ("腾讯", "nt"),
    ("阿里巴巴", "nt"),
    ("华为", "nt"),
    ("字节跳动", "nt"),
    ("微信", "nz"),
    ("抖音", "nz"),
    ("春节", "nz"),
    ("中秋节", "nz"),
    ("国庆节", "nz"),
    ("睡不着", "v"),
    ("睡不好", "v"),
    ("喜欢的人", "n"),
];
