//! Static topic dictionary for keyword expansion.
//!
//! A topic token expands to a set of related terms; the filter matches
//! any of them with Unicode word boundaries. Keys not present here fall
//! back to a literal word-boundary match of the token itself.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

pub static TOPIC_KEYWORDS: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        "ai",
        vec![
            "ai", "artificial intelligence", "machine learning", "deep learning",
            "neural network", "gpt", "llm", "large language model", "chatgpt",
            "claude", "gemini", "openai", "anthropic", "google ai", "ai model",
            "agent", "agentic", "generative ai", "transformer", "nlp",
            "natural language", "computer vision", "chatbot", "copilot",
            "ai assistant", "prompt engineering", "fine-tuning", "embedding",
            "google deepmind", "nvidia", "apple intelligence", "meta ai",
            "deepseek", "mistral", "hugging face", "stable diffusion",
            "diffusion model", "text to image", "text to video", "ai safety", "agi",
        ],
    );
    m.insert(
        "tech",
        vec![
            "technology", "tech", "software", "hardware", "startup", "gadget",
            "smartphone", "laptop", "cloud", "cyber", "programming", "developer",
            "app", "web", "digital", "innovation", "tech industry",
            "blockchain", "metaverse", "virtual reality", "augmented reality", "vr", "ar",
            "tablet", "wearable", "smartwatch", "smart home", "iot",
            "internet of things", "5g", "wifi", "browser", "operating system",
            "android", "ios", "windows", "macos", "linux",
            "data center", "server", "database", "api", "saas", "devops",
            "cybersecurity", "hacking", "malware", "ransomware", "phishing",
            "data breach", "silicon valley", "product launch", "tech giant",
        ],
    );
    m.insert(
        "crypto",
        vec![
            "crypto", "cryptocurrency", "bitcoin", "btc", "ethereum", "eth",
            "blockchain", "web3", "nft", "defi", "token", "wallet", "mining",
            "altcoin", "stablecoin", "binance", "coinbase", "solana", "dogecoin",
            "smart contract", "dapp", "dao", "airdrop", "ico", "crypto exchange",
        ],
    );
    m.insert(
        "startup",
        vec![
            "startup", "unicorn", "funding", "seed round", "series a", "series b",
            "venture capital", "vc", "angel investor", "accelerator", "incubator",
            "entrepreneur", "founder", "ceo", "cto", "pivot", "acquisition",
            "merger", "ipo", "valuation", "burn rate", "mvp", "scale up",
            "fintech", "edtech", "healthtech", "y combinator", "sequoia",
        ],
    );
    m.insert(
        "gaming",
        vec![
            "gaming", "video game", "esports", "playstation", "xbox", "nintendo",
            "steam", "pc gaming", "mobile gaming", "pubg", "fortnite",
            "call of duty", "gta", "minecraft", "valorant", "league of legends",
            "dota", "twitch", "gamer", "console", "gpu", "graphics card", "ps5",
            "gaming tournament",
        ],
    );
    m.insert(
        "cricket",
        vec![
            "cricket", "ipl", "test match", "odi", "t20", "bcci", "wicket",
            "batsman", "batter", "bowler", "innings", "stumps", "six", "four",
            "cricket world cup", "virat kohli", "rohit sharma", "ms dhoni",
            "century", "half century", "hat trick", "lbw", "boundary", "pitch",
            "world cup", "asia cup", "border gavaskar trophy", "ashes", "icc",
            "champions trophy", "ranji trophy",
        ],
    );
    m.insert(
        "finance",
        vec![
            "finance", "stock", "market", "investment", "banking", "rupee",
            "dollar", "share", "sensex", "nifty", "portfolio", "mutual fund",
            "dividend", "ipo", "trading", "financial", "economy", "economics",
            "fiscal", "budget", "commodity", "gold", "silver", "bond", "forex",
            "rbi", "reserve bank", "interest rate", "inflation", "gdp",
            "recession", "bull market", "bear market", "nasdaq", "dow jones",
            "hedge fund", "private equity", "venture capital", "fintech",
            "digital payment", "tax", "income tax",
        ],
    );
    m.insert(
        "business",
        vec![
            "business", "company", "revenue", "profit", "earnings", "quarterly",
            "acquisition", "merger", "deal", "enterprise", "industry",
            "manufacturing", "retail", "supply chain", "layoffs", "expansion",
            "market share", "shareholder", "ipo", "valuation", "ceo",
        ],
    );
    m.insert(
        "sports",
        vec![
            "sports", "cricket", "football", "soccer", "tennis", "badminton",
            "hockey", "basketball", "volleyball", "athlete", "tournament",
            "championship", "medal", "olympics", "match", "team",
            "player", "coach", "premier league", "la liga", "bundesliga",
            "nba", "nfl", "fifa", "uefa", "formula 1", "f1", "grand prix",
            "boxing", "mma", "ufc", "wrestling", "swimming", "marathon",
            "asian games", "commonwealth games", "world championship",
        ],
    );
    m.insert(
        "politics",
        vec![
            "politics", "election", "parliament", "government", "minister",
            "political", "policy", "vote", "democracy", "law", "bill",
            "congress", "lok sabha", "rajya sabha", "prime minister",
            "president", "cabinet", "opposition", "ruling party", "manifesto",
            "campaign", "rally", "governor", "chief minister",
            "supreme court", "high court", "judiciary", "legislation",
            "foreign policy", "diplomacy", "g20", "brics", "united nations",
        ],
    );
    m.insert(
        "health",
        vec![
            "health", "medical", "doctor", "hospital", "disease", "vaccine",
            "covid", "pandemic", "wellness", "fitness", "nutrition", "medicine",
            "healthcare", "virus", "treatment", "patient", "surgery",
            "diagnosis", "mental health", "anxiety", "depression", "therapy",
            "diet", "exercise", "yoga", "meditation", "workout",
            "cancer", "diabetes", "heart disease", "blood pressure", "pharma",
        ],
    );
    m.insert(
        "entertainment",
        vec![
            "entertainment", "movie", "film", "cinema", "bollywood", "hollywood",
            "actor", "actress", "celebrity", "music", "concert", "album",
            "netflix", "amazon prime", "ott", "web series", "tv show",
            "box office", "premiere", "trailer", "award", "oscar", "grammy",
            "emmy", "golden globe", "director", "producer",
            "streaming", "disney", "youtube", "influencer", "viral",
        ],
    );
    m.insert(
        "education",
        vec![
            "education", "school", "college", "university", "student", "teacher",
            "exam", "admission", "scholarship", "degree", "course", "learning",
            "neet", "jee", "upsc", "cbse", "academic", "graduation",
            "iit", "iim", "gate", "gmat", "gre", "board exam",
            "online learning", "edtech", "coaching",
        ],
    );
    m.insert(
        "auto",
        vec![
            "auto", "automobile", "car", "bike", "motorcycle",
            "electric vehicle", "ev", "tesla", "tata", "mahindra", "maruti",
            "hyundai", "toyota", "honda", "bmw", "mercedes", "audi",
            "suv", "sedan", "hatchback", "petrol", "diesel", "hybrid",
            "charging station", "battery", "self driving", "autonomous",
            "car launch", "auto expo",
        ],
    );
    m.insert(
        "travel",
        vec![
            "travel", "tourism", "vacation", "holiday", "flight", "airline",
            "hotel", "resort", "booking", "destination", "trip", "tour",
            "passport", "visa", "airport", "railway", "train", "cruise",
            "airbnb", "travel advisory",
        ],
    );
    m.insert(
        "weather",
        vec![
            "weather", "rain", "rainfall", "monsoon", "storm", "cyclone",
            "hurricane", "flood", "drought", "heatwave", "cold wave", "snow",
            "snowfall", "temperature", "forecast", "imd", "climate",
            "climate change", "global warming", "thunderstorm", "fog", "smog",
            "pollution", "aqi",
        ],
    );
    m.insert(
        "realestate",
        vec![
            "real estate", "property", "housing", "apartment", "flat", "villa",
            "builder", "developer", "construction", "rera", "home loan",
            "mortgage", "rent", "tenant", "landlord", "commercial",
            "residential", "plot", "land", "infrastructure", "smart city",
            "affordable housing",
        ],
    );
    m.insert(
        "jobs",
        vec![
            "jobs", "job", "employment", "hiring", "recruitment", "vacancy",
            "career", "resume", "interview", "salary", "layoff", "fired",
            "fresher", "remote work", "work from home", "hybrid",
            "linkedin", "appraisal", "promotion", "internship",
            "placement", "campus recruitment", "gig economy", "freelance",
        ],
    );
    m.insert(
        "mobile",
        vec![
            "mobile", "smartphone", "phone", "iphone", "android", "samsung",
            "pixel", "oneplus", "xiaomi", "oppo", "vivo", "realme",
            "5g phone", "foldable", "flagship", "handset", "mobile launch",
            "camera phone", "battery life", "fast charging", "snapdragon",
            "mediatek",
        ],
    );
    m.insert(
        "laptop",
        vec![
            "laptop", "notebook", "macbook", "chromebook", "ultrabook",
            "thinkpad", "dell", "lenovo", "asus", "acer", "hp",
            "gaming laptop", "processor", "intel", "amd", "ryzen", "apple m",
            "ram", "ssd", "display", "battery life", "laptop launch",
        ],
    );
    m
});

/// Compiled word-boundary alternation per topic key. Phrases are
/// escaped, so multi-word terms match as phrases bounded on both ends.
static TOPIC_PATTERNS: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    TOPIC_KEYWORDS
        .iter()
        .filter(|(_, words)| !words.is_empty())
        .map(|(key, words)| {
            let alternation = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            let re = Regex::new(&format!(r"(?u)\b(?:{alternation})\b"))
                .expect("topic pattern");
            (*key, re)
        })
        .collect()
});

/// Expanded keyword list for a topic key, if the dictionary knows it.
pub fn keywords_for(topic: &str) -> Option<&'static [&'static str]> {
    TOPIC_KEYWORDS.get(topic).map(|v| v.as_slice())
}

/// Word-boundary matcher for a known topic key.
pub fn pattern_for(topic: &str) -> Option<&'static Regex> {
    TOPIC_PATTERNS.get(topic)
}
