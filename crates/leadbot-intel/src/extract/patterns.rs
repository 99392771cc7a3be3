//! Rule tables for entity extraction. Order is priority: the first rule
//! that yields an acceptable candidate wins.

use std::sync::LazyLock;

use regex::Regex;

const NAME_WORDS: &str = r"([A-Za-z][A-Za-z'\-]*(?:\s+[A-Za-z][A-Za-z'\-]*)?)";
const COMPANY_PHRASE: &str = r"([A-Z][A-Za-z0-9&'.\-]*(?:\s+[A-Z0-9][A-Za-z0-9&'.\-]*){0,3})";
const LOOSE_COMPANY_PHRASE: &str =
    r"([A-Za-z0-9][A-Za-z0-9&'.\-]*(?:\s+[A-Z0-9][A-Za-z0-9&'.\-]*){0,3})";

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid extraction regex")
}

pub(super) static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}\b"));

pub(super) static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?:\+\d{1,3}[\s.\-]?)?(?:\(\d{3}\)|\b\d{3})[\s.\-]?\d{3}[\s.\-]?\d{4}\b")
});

/// "my name is X", "call me X", "I'm X", "this is X", "X here".
pub(super) static NAME_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"(?i)\bmy name(?:'s| is)\s+{NAME_WORDS}"),
        r"(?i)\bcall me\s+([A-Za-z][A-Za-z'\-]*)".to_string(),
        format!(r"(?i)\b(?:i['’]m|i am|im)\s+{NAME_WORDS}"),
        format!(r"(?i)\bthis is\s+{NAME_WORDS}"),
        format!(r"(?i)(?:^|[.!?,;]\s*){NAME_WORDS}\s+here\b"),
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

/// Tokens that disqualify a name candidate on top of the shared stoplist.
pub(super) const NAME_REJECT: &[&str] = &[
    "ceo", "cto", "cio", "ciso", "cfo", "coo", "cpo", "vp", "head", "director", "manager",
    "founder", "cofounder", "co-founder", "engineer", "developer", "owner", "president", "lead",
    "senior", "principal", "chief", "worried", "concerned", "excited", "planning", "hoping",
    "doing", "using", "building", "running", "leading", "part", "afraid", "ready", "able",
    "unable", "asking", "thinking", "after", "about", "getting", "needing", "pretty", "kind",
];

pub(super) static COMPANY_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"(?i:\b(?:my |our |the )?company(?:'s| name is| is called| is))\s+{LOOSE_COMPANY_PHRASE}"),
        format!(r"(?i:\bwork(?:ing)? (?:for|at))\s+{COMPANY_PHRASE}"),
        format!(r"(?i:\b(?:i|we) represent)\s+{COMPANY_PHRASE}"),
        format!(r"(?i:\bfrom)\s+{COMPANY_PHRASE}"),
        format!(r"(?i:\bat)\s+{COMPANY_PHRASE}"),
        r"\b([A-Z][A-Za-z0-9&'\-]*(?:\s+[A-Z][A-Za-z0-9&'\-]*){0,3}\s+(?:Inc|LLC|Ltd|Corporation|Corp|GmbH|Co)\b\.?)"
            .to_string(),
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

/// Capitalised words that follow "at"/"from" without naming a company.
pub(super) const COMPANY_REJECT: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "january",
    "february", "march", "april", "may", "june", "july", "august", "september", "october",
    "november", "december", "ai", "llm", "gpt", "chatgpt", "least", "scale",
];

pub(super) const COMPANY_SUFFIXES: &[&str] =
    &["inc.", "co.", "corp.", "ltd.", "llc.", "gmbh."];

const TITLE: &str = r"(chief [a-z]+ officer|ceo|cto|cio|ciso|cfo|coo|cpo|vp of [a-z]+|vp,? [a-z]+|vice president of [a-z]+|head of [a-z]+|director of [a-z]+|[a-z]+ director|[a-z]+ manager|co-?founder|founder|owner|compliance officer|(?:senior |lead |staff |principal )?(?:software |security |ml |data |platform |devops |solutions )?(?:engineer|architect|developer|analyst))\b";

pub(super) static JOB_TITLE_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"(?i)\bmy (?:role|title|position|job) is\s+(?:a |an |the )?{TITLE}"),
        format!(r"(?i)\b(?:i['’]m|i am|im|i work as|working as|as)\s+(?:a |an |the |our |their )?{TITLE}"),
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

pub(super) const TITLE_ACRONYMS: &[&str] = &[
    "ceo", "cto", "cio", "ciso", "cfo", "coo", "cpo", "vp", "ml", "it", "hr", "devops",
];

pub(super) const INDUSTRIES: &[(&str, &[&str])] = &[
    (
        "healthcare",
        &[
            "healthcare", "health care", "hospital", "hospitals", "clinic", "medical",
            "patient", "patients", "pharma", "biotech",
        ],
    ),
    (
        "financial services",
        &[
            "bank", "banking", "fintech", "financial services", "insurance", "insurer",
            "lending", "payments", "wealth management",
        ],
    ),
    (
        "government",
        &["government", "public sector", "federal", "municipal", "state agency"],
    ),
    (
        "education",
        &["university", "school", "education", "edtech", "college"],
    ),
    ("legal", &["law firm", "legal services", "attorneys"]),
    (
        "retail",
        &["retail", "ecommerce", "e-commerce", "online store"],
    ),
    (
        "manufacturing",
        &["manufacturing", "manufacturer", "factory", "industrial", "supply chain"],
    ),
    (
        "technology",
        &["saas", "software company", "tech company", "software vendor"],
    ),
];

pub(super) static COMPANY_SIZE_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(\d[\d,]*)\s*\+?\s*(?:employees|people|staff|team members|person company)\b",
        r"(?i)\bteam of\s+(\d[\d,]*)\b",
        r"(?i)\bheadcount (?:is |of )?(?:about |around |roughly )?(\d[\d,]*)\b",
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

pub(super) const ENTERPRISE_MARKERS: &[&str] = &["enterprise", "fortune 500", "fortune 1000"];

pub(super) const PAIN_POINTS: &[(&str, &[&str])] = &[
    (
        "manual processes",
        &["manual", "manually", "spreadsheet", "spreadsheets", "by hand"],
    ),
    (
        "security risk",
        &[
            "security risk", "data leak", "data leakage", "leakage", "breach", "vulnerability",
            "exfiltration",
        ],
    ),
    (
        "shadow ai",
        &[
            "shadow ai", "unsanctioned", "no visibility", "lack of visibility", "visibility",
            "don't know what ai",
        ],
    ),
    (
        "audit burden",
        &["audit", "audits", "auditors", "evidence collection"],
    ),
    (
        "governance gaps",
        &["governance", "oversight", "policy enforcement", "guardrails"],
    ),
    (
        "cost overruns",
        &["too expensive", "overspend", "overspending", "cost overrun", "runaway cost"],
    ),
    ("scaling", &["scale", "scaling", "growing fast"]),
];

pub(super) static COMPLIANCE_FRAMEWORKS: LazyLock<Vec<(&'static str, Regex)>> =
    LazyLock::new(|| {
        [
            ("SOC 2", r"(?i)\bsoc\s*-?\s*2\b|\bsoc2\b"),
            ("HIPAA", r"(?i)\bhipaa\b"),
            ("GDPR", r"(?i)\bgdpr\b"),
            ("ISO 27001", r"(?i)\biso\s*-?\s*27001\b"),
            ("ISO 42001", r"(?i)\biso\s*-?\s*42001\b"),
            ("PCI DSS", r"(?i)\bpci(?:[\s-]?dss)?\b"),
            ("FedRAMP", r"(?i)\bfedramp\b"),
            ("CCPA", r"(?i)\bccpa\b"),
            ("NIST AI RMF", r"(?i)\bnist\b"),
            ("EU AI Act", r"(?i)\b(?:eu )?ai act\b"),
        ]
        .into_iter()
        .map(|(label, p)| (label, compile(p)))
        .collect()
    });

pub(super) const USE_CASES: &[(&str, &[&str])] = &[
    (
        "customer support",
        &[
            "customer support", "support tickets", "helpdesk", "help desk", "customer service",
        ],
    ),
    (
        "sales automation",
        &["sales team", "lead generation", "outbound", "crm"],
    ),
    (
        "software development",
        &["coding", "code generation", "code review", "developers"],
    ),
    (
        "document processing",
        &["documents", "contracts", "invoices", "document processing"],
    ),
    (
        "data analysis",
        &["analytics", "data analysis", "reporting", "dashboards"],
    ),
    (
        "internal knowledge",
        &["knowledge base", "internal search", "wiki", "onboarding"],
    ),
];

pub(super) static NO_AI_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:we|i)\s+(?:don't|do not|dont|aren't|are not)\s+(?:use|using|have|run)\s+(?:any\s+)?(?:ai|llms?|agents?|chatgpt|genai)\b",
        r"(?i)\bno\s+(?:ai|agents)\s+(?:yet|today|at all)\b",
        r"(?i)\bnot\s+using\s+(?:any\s+)?(?:ai|llms?|agents?)\b",
        r"(?i)\bhaven't\s+(?:started|adopted|deployed)\b",
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

pub(super) static HAS_AI_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:we|i|our teams?)\s*(?:'re|are)?\s+(?:already\s+|currently\s+)?(?:use|using|have|run|running|deployed|rolled out)\s+(?:[a-z]+\s+){0,3}?(?:ai|chatgpt|gpt|copilot|claude|gemini|llms?|agents?|openai)\b",
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

pub(super) static AGENT_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b(\d{1,5})\s+(?:ai\s+)?(?:agents|bots|assistants|copilots)\b")
});
