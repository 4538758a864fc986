//! I/O boundary traits for testability
//!
//! The permutation engine only ever sees bracketed tree strings. Turning a
//! natural-language sentence into one is delegated to a [`SentenceParser`],
//! which in production is a CoreNLP server reached over HTTP.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::ParserSettings;
use crate::infrastructure::{InfraError, InfraResult};

/// Annotators requested from CoreNLP.
const ANNOTATORS: &str = "tokenize,ssplit,pos,parse";

/// Failure of the parser collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("parser unreachable: {0}")]
    Transport(String),

    #[error("parser returned HTTP {0}")]
    Status(u16),

    #[error("malformed parser response: {0}")]
    Malformed(String),

    #[error("parser returned no parse for the sentence")]
    EmptyAnnotation,
}

/// Constituency parser abstraction.
pub trait SentenceParser: Send + Sync {
    /// Parse a sentence into a bracketed tree string.
    fn parse(&self, sentence: &str) -> Result<String, ParseFailure>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// CoreNLP server client.
#[derive(Debug)]
pub struct CoreNlpParser {
    client: Client,
    url: String,
    language: String,
}

impl CoreNlpParser {
    pub fn new(settings: &ParserSettings) -> InfraResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| InfraError::http("build HTTP client", e))?;
        Ok(Self {
            client,
            url: settings.url.clone(),
            language: settings.language.clone(),
        })
    }
}

impl SentenceParser for CoreNlpParser {
    #[instrument(level = "debug", skip(self))]
    fn parse(&self, sentence: &str) -> Result<String, ParseFailure> {
        let properties = serde_json::json!({ "annotators": ANNOTATORS }).to_string();
        let response = self
            .client
            .post(&self.url)
            .query(&[
                ("properties", properties.as_str()),
                ("pipelineLanguage", self.language.as_str()),
            ])
            .body(sentence.to_owned())
            .send()
            .map_err(|e| ParseFailure::Transport(e.to_string()))?;

        let status = response.status();
        debug!("parse: {} responded {}", self.url, status);
        if !status.is_success() {
            return Err(ParseFailure::Status(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| ParseFailure::Malformed(e.to_string()))?;
        first_parse(&body)
    }
}

#[derive(Debug, Deserialize)]
struct AnnotationResponse {
    #[serde(default)]
    sentences: Vec<AnnotatedSentence>,
}

#[derive(Debug, Deserialize)]
struct AnnotatedSentence {
    parse: Option<String>,
}

/// Extract the parse of the first sentence from a CoreNLP JSON document.
fn first_parse(body: &str) -> Result<String, ParseFailure> {
    let response: AnnotationResponse =
        serde_json::from_str(body).map_err(|e| ParseFailure::Malformed(e.to_string()))?;
    response
        .sentences
        .into_iter()
        .next()
        .and_then(|sentence| sentence.parse)
        .filter(|parse| !parse.trim().is_empty())
        .ok_or(ParseFailure::EmptyAnnotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn given_corenlp_document_when_extracting_then_returns_first_parse() {
        let body = r#"{"sentences": [
            {"index": 0, "parse": "(ROOT (S (NP (NN it)) (VP (VBZ works))))"},
            {"index": 1, "parse": "(ROOT (NP (NN ignored)))"}
        ]}"#;

        assert_eq!(
            first_parse(body),
            Ok("(ROOT (S (NP (NN it)) (VP (VBZ works))))".to_string())
        );
    }

    #[test]
    fn given_no_sentences_when_extracting_then_reports_empty_annotation() {
        assert_eq!(first_parse(r#"{"sentences": []}"#), Err(ParseFailure::EmptyAnnotation));
        assert_eq!(first_parse("{}"), Err(ParseFailure::EmptyAnnotation));
        assert_eq!(
            first_parse(r#"{"sentences": [{"parse": "  "}]}"#),
            Err(ParseFailure::EmptyAnnotation)
        );
    }

    #[test]
    fn given_non_json_body_when_extracting_then_reports_malformed() {
        let result = first_parse("<html>busy</html>");

        assert!(matches!(result, Err(ParseFailure::Malformed(_))));
    }

    /// Answer exactly one HTTP request with `response`; yields the request head and body.
    fn serve_once(response: String) -> (String, thread::JoinHandle<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
                head.push_str(&line);
            }
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();
            reader.get_mut().write_all(response.as_bytes()).unwrap();
            (head, String::from_utf8(body).unwrap())
        });
        (url, handle)
    }

    fn parser_for(url: String) -> CoreNlpParser {
        CoreNlpParser::new(&ParserSettings {
            url,
            language: "de".into(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn given_server_answering_json_when_parsing_then_sends_properties_and_language() {
        let body = r#"{"sentences": [{"parse": "(ROOT (S (NP (NN es)) (VP (VBZ geht))))"}]}"#;
        let (url, server) = serve_once(format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        ));

        let result = parser_for(url).parse("Es geht.");

        let (head, sent) = server.join().unwrap();
        assert_eq!(result, Ok("(ROOT (S (NP (NN es)) (VP (VBZ geht))))".to_string()));
        let request_line = head.lines().next().unwrap();
        assert!(request_line.starts_with("POST /?"), "{request_line}");
        assert!(request_line.contains("properties="), "{request_line}");
        assert!(request_line.contains("pipelineLanguage=de"), "{request_line}");
        assert_eq!(sent, "Es geht.");
    }

    #[test]
    fn given_server_answering_503_when_parsing_then_reports_status() {
        let (url, server) = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                .to_string(),
        );

        let result = parser_for(url).parse("The cat ran.");

        server.join().unwrap();
        assert_eq!(result, Err(ParseFailure::Status(503)));
    }

    #[test]
    fn given_closed_port_when_parsing_then_reports_transport_failure() {
        let url = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}/", listener.local_addr().unwrap())
        };

        let result = parser_for(url).parse("The cat ran.");

        assert!(matches!(result, Err(ParseFailure::Transport(_))), "{result:?}");
    }

    #[test]
    fn given_settings_when_building_client_then_keeps_endpoint() {
        let settings = ParserSettings::default();

        let parser = CoreNlpParser::new(&settings).unwrap();

        assert_eq!(parser.url, settings.url);
        assert_eq!(parser.language, "en");
    }
}
