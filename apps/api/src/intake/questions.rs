//! Question Generator: tailored technical questions for a declared tech stack.
//!
//! Two tiers: the LLM first, then the curated bank below. The public entry
//! point never fails and always yields between one and five questions.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::llm_client::prompts::{QUESTION_SYSTEM, TECH_QA_PROMPT_TEMPLATE};
use crate::llm_client::{ChatMessage, ChatOutcome, ChatRequest, Responder, Role};

pub const MAX_QUESTIONS: usize = 5;

static LIST_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[Qq]?\d+[.):]\s*)").unwrap());

/// Curated per-technology questions, five each. Order matters: a stack token is
/// matched against keys top to bottom, so "javascript" must precede "java".
const QUESTION_BANK: &[(&str, [&str; 5])] = &[
    (
        "python",
        [
            "Explain list vs tuple and when to use each.",
            "What are list comprehensions and why are they useful?",
            "How does Python's GIL affect multithreading?",
            "What is a generator? Show a simple example.",
            "Explain context managers and the 'with' statement.",
        ],
    ),
    (
        "django",
        [
            "What are Django models and migrations?",
            "Explain Django's MVT architecture.",
            "How do you optimize ORM queries in Django?",
            "What is middleware and a use case for custom middleware?",
            "How would you implement authentication in Django?",
        ],
    ),
    (
        "flask",
        [
            "How do blueprints help structure a Flask app?",
            "What is the difference between the Flask debug server and a production WSGI server?",
            "Explain request context and application context in Flask.",
            "How do you handle configuration and secrets in Flask?",
            "How would you add authentication and authorization in Flask?",
        ],
    ),
    (
        "sql",
        [
            "Explain INNER JOIN vs LEFT JOIN with a simple example.",
            "What are indexes and how can they speed up queries?",
            "How do you find slow queries and optimize them?",
            "Explain ACID properties in relational databases.",
            "What is normalization and when would you denormalize?",
        ],
    ),
    (
        "pandas",
        [
            "How do you handle missing values in pandas DataFrames?",
            "Explain vectorization and why it's faster than loops in pandas.",
            "How do you merge or join DataFrames and when would you use each?",
            "What is groupby and an example use case?",
            "How do you optimize memory usage in pandas?",
        ],
    ),
    (
        "numpy",
        [
            "Explain broadcasting in NumPy with an example.",
            "How do you create views vs copies and why does it matter?",
            "What is vectorization and why is it useful in NumPy?",
            "How do you compute the dot product and matrix multiplication?",
            "How do you efficiently filter arrays by conditions?",
        ],
    ),
    (
        "pytorch",
        [
            "Explain autograd and computational graphs in PyTorch.",
            "What is the difference between a Module and a Tensor?",
            "How do you prevent overfitting in a PyTorch model?",
            "How do you move tensors between CPU and GPU?",
            "What is a DataLoader and why is it useful?",
        ],
    ),
    (
        "tensorflow",
        [
            "What are eager execution and graph execution in TensorFlow?",
            "How do you save and load a trained model?",
            "How do you implement early stopping?",
            "What is tf.data and why is it useful?",
            "Explain the difference between the Keras Sequential and Functional APIs.",
        ],
    ),
    (
        "ml",
        [
            "Explain the bias-variance tradeoff with an example.",
            "How do you choose between classification and regression models?",
            "What is cross-validation and why is it important?",
            "Explain precision, recall, and F1-score.",
            "How do you handle class imbalance?",
        ],
    ),
    (
        "javascript",
        [
            "Explain var vs let vs const.",
            "What are closures and a practical example?",
            "How does the event loop work in JavaScript?",
            "Explain promises vs async/await.",
            "What is debounce vs throttle and a use case for each?",
        ],
    ),
    (
        "react",
        [
            "Explain state vs props.",
            "What are hooks and why use useEffect?",
            "How do you optimize performance in React apps?",
            "What is reconciliation and why do list items need keys?",
            "How do you manage global state?",
        ],
    ),
    (
        "java",
        [
            "Explain the difference between an interface and an abstract class.",
            "How does garbage collection work in the JVM?",
            "What is the difference between HashMap and ConcurrentHashMap?",
            "Explain checked vs unchecked exceptions.",
            "How do streams differ from traditional loops?",
        ],
    ),
    (
        "rust",
        [
            "Explain ownership and borrowing in Rust.",
            "When would you use Box, Rc, or Arc?",
            "What is the difference between String and &str?",
            "How do traits differ from interfaces in other languages?",
            "How does Rust prevent data races at compile time?",
        ],
    ),
    (
        "docker",
        [
            "What is the difference between an image and a container?",
            "How do multi-stage builds reduce image size?",
            "How do you persist data from a container?",
            "Explain the difference between CMD and ENTRYPOINT.",
            "How do containers on the same host communicate?",
        ],
    ),
];

const GENERIC_QUESTIONS: [&str; 5] = [
    "Explain a challenging problem you solved with your preferred technology.",
    "How do you test and debug your code effectively?",
    "Describe a time you optimized performance in an application.",
    "How do you ensure code quality and readability?",
    "What best practices do you follow in your projects?",
];

/// Questions for `tech_stack`, from the LLM when it answers usefully, else from the bank.
pub async fn generate_tech_questions(tech_stack: &str, responder: &Responder) -> Vec<String> {
    let request = ChatRequest {
        system: QUESTION_SYSTEM.to_string(),
        messages: vec![ChatMessage::new(
            Role::User,
            TECH_QA_PROMPT_TEMPLATE.replace("{tech_stack}", tech_stack),
        )],
        temperature: 0.2,
        max_tokens: 400,
    };

    match responder.respond(&request).await {
        ChatOutcome::Reply(text) => {
            let questions = parse_question_lines(&text);
            if questions.is_empty() {
                info!("LLM reply held no usable questions, using fallback bank");
                generate_fallback_questions(tech_stack, MAX_QUESTIONS)
            } else {
                debug!("Parsed {} questions from LLM reply", questions.len());
                questions
            }
        }
        ChatOutcome::Unavailable(reason) => {
            info!("Question generation using fallback bank ({reason})");
            generate_fallback_questions(tech_stack, MAX_QUESTIONS)
        }
    }
}

/// Splits an LLM reply into questions: drops list markers (`1.`, `2)`, `-`, `*`),
/// heading lines ending in `:`, and blanks; keeps at most five.
pub fn parse_question_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().trim_matches(|c: char| matches!(c, ' ' | '-' | '*' | '•')))
        .map(|line| LIST_MARKER_RE.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty() && !line.ends_with(':'))
        .take(MAX_QUESTIONS)
        .collect()
}

/// Bank-based questions. Each comma token is matched (substring or equality)
/// against the bank keys in order; matched technologies are interleaved so a
/// multi-technology stack gets questions from each. No match yields the generic list.
pub fn generate_fallback_questions(tech_stack: &str, max_questions: usize) -> Vec<String> {
    let limit = max_questions.clamp(1, MAX_QUESTIONS);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut matched: Vec<&[&str; 5]> = Vec::new();

    for token in tech_stack
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
    {
        if let Some((key, questions)) = QUESTION_BANK
            .iter()
            .find(|(key, _)| token.contains(key) && !seen.contains(key))
        {
            seen.insert(*key);
            matched.push(questions);
        }
    }

    if matched.is_empty() {
        return GENERIC_QUESTIONS
            .iter()
            .take(limit)
            .map(|q| q.to_string())
            .collect();
    }

    let mut out = Vec::with_capacity(limit);
    'rounds: for round in 0..MAX_QUESTIONS {
        for questions in &matched {
            if out.len() >= limit {
                break 'rounds;
            }
            out.push(questions[round].to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm_client::tests::{CannedBackend, FailingBackend};

    fn bank(key: &str) -> &'static [&'static str; 5] {
        &QUESTION_BANK.iter().find(|(k, _)| *k == key).unwrap().1
    }

    #[test]
    fn test_fallback_covers_every_listed_technology() {
        let questions = generate_fallback_questions("Python, SQL", MAX_QUESTIONS);
        assert!((1..=5).contains(&questions.len()));
        assert!(questions.iter().any(|q| bank("python").contains(&q.as_str())));
        assert!(questions.iter().any(|q| bank("sql").contains(&q.as_str())));
    }

    #[test]
    fn test_fallback_unknown_stack_gets_generic_list() {
        let questions = generate_fallback_questions("Cobol", MAX_QUESTIONS);
        assert_eq!(questions, GENERIC_QUESTIONS.map(str::to_string).to_vec());
    }

    #[test]
    fn test_fallback_single_technology_uses_its_whole_list() {
        let questions = generate_fallback_questions("react", MAX_QUESTIONS);
        assert_eq!(questions, bank("react").map(str::to_string).to_vec());
    }

    #[test]
    fn test_fallback_prefers_javascript_over_java() {
        let questions = generate_fallback_questions("JavaScript", MAX_QUESTIONS);
        assert_eq!(questions[0], bank("javascript")[0]);
    }

    #[test]
    fn test_fallback_substring_match_and_dedup() {
        // "postgresql" and "mysql" both hit the sql key; the second adds nothing new.
        let questions = generate_fallback_questions("PostgreSQL, MySQL", MAX_QUESTIONS);
        assert_eq!(questions, bank("sql").map(str::to_string).to_vec());
    }

    #[test]
    fn test_fallback_respects_limit() {
        let questions = generate_fallback_questions("python, django, flask, sql, react, rust", 5);
        assert_eq!(questions.len(), 5);
        let capped = generate_fallback_questions("python", 2);
        assert_eq!(capped.len(), 2);
        let floor = generate_fallback_questions("python", 0);
        assert_eq!(floor.len(), 1);
    }

    #[test]
    fn test_parse_strips_list_markers() {
        let reply = "Here are your questions:\n\
                     1. What is ownership?\n\
                     2) How do lifetimes work?\n\
                     - Explain traits.\n\
                     \n\
                     * What is Send?";
        assert_eq!(
            parse_question_lines(reply),
            vec![
                "What is ownership?",
                "How do lifetimes work?",
                "Explain traits.",
                "What is Send?",
            ]
        );
    }

    #[test]
    fn test_parse_keeps_at_most_five() {
        let reply = (1..=8)
            .map(|i| format!("{i}. Question {i}?"))
            .collect::<Vec<_>>()
            .join("\n");
        let parsed = parse_question_lines(&reply);
        assert_eq!(parsed.len(), 5);
        assert_eq!(parsed[4], "Question 5?");
    }

    #[tokio::test]
    async fn test_llm_questions_used_when_available() {
        let responder = Responder::new(Arc::new(CannedBackend(
            "1. What is a borrow checker?\n2. Explain async in Rust.".to_string(),
        )));
        let questions = generate_tech_questions("Rust", &responder).await;
        assert_eq!(
            questions,
            vec!["What is a borrow checker?", "Explain async in Rust."]
        );
    }

    #[tokio::test]
    async fn test_unusable_llm_reply_falls_back() {
        let responder = Responder::new(Arc::new(CannedBackend("Sure:\n---".to_string())));
        let questions = generate_tech_questions("Python", &responder).await;
        assert_eq!(questions, bank("python").map(str::to_string).to_vec());
    }

    #[tokio::test]
    async fn test_unreachable_llm_falls_back() {
        let responder = Responder::new(Arc::new(FailingBackend));
        let questions = generate_tech_questions("Cobol", &responder).await;
        assert_eq!(questions.len(), 5);
        assert_eq!(questions[0], GENERIC_QUESTIONS[0]);
    }
}
