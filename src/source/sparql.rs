use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use super::KnowledgeSource;
use crate::config::SourceConfig;
use crate::error::{DynastyError, Result};
use crate::model::{parse_iso_date, Person, Qid};

/// Response structure from a SPARQL JSON endpoint
#[derive(Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Deserialize)]
struct SparqlResults {
    #[serde(default)]
    bindings: Vec<HashMap<String, SparqlValue>>,
}

/// Individual bound value in a result row
#[derive(Deserialize)]
struct SparqlValue {
    value: String,
}

type Binding = HashMap<String, SparqlValue>;

/// Wikidata Query Service client
///
/// Issues one SPARQL request per call. No retries and no caching: both are
/// decided by the caller.
pub struct WikidataClient {
    client: Client,
    endpoint: String,
    primary_language: String,
    secondary_language: String,
}

impl WikidataClient {
    /// Create a client from the `[source]` configuration section
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DynastyError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            primary_language: config.primary_language.clone(),
            secondary_language: config.secondary_language.clone(),
        })
    }

    async fn run_query(&self, query: &str) -> Result<Vec<Binding>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query), ("format", "json")])
            .header("Accept", "application/sparql-results+json")
            .send()
            .await
            .map_err(|e| DynastyError::Query(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(DynastyError::Query(format!("SPARQL endpoint error {}: {}", status, body)));
        }

        let parsed: SparqlResponse = response
            .json()
            .await
            .map_err(|e| DynastyError::Query(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.results.bindings)
    }
}

impl KnowledgeSource for WikidataClient {
    async fn fetch_person(&self, qid: &Qid) -> Result<Person> {
        let query = person_query(qid, &self.primary_language, &self.secondary_language);
        let bindings = self.run_query(&query).await?;
        let binding = bindings
            .into_iter()
            .next()
            .ok_or_else(|| DynastyError::Query(format!("No result row for {}", qid)))?;
        Ok(person_from_binding(qid, &binding))
    }

    async fn fetch_children(&self, qid: &Qid) -> Result<Vec<Qid>> {
        let bindings = self.run_query(&children_query(qid)).await?;
        Ok(bindings
            .iter()
            .filter_map(|b| entity_value(b, "child"))
            .collect())
    }
}

fn person_query(qid: &Qid, primary: &str, secondary: &str) -> String {
    format!(
        r#"SELECT ?labelPrimary ?labelSecondary ?birth ?death ?father ?mother ?birthPlaceLabel
WHERE {{
  OPTIONAL {{ wd:{qid} rdfs:label ?labelPrimary . FILTER(LANG(?labelPrimary) = "{primary}") }}
  OPTIONAL {{ wd:{qid} rdfs:label ?labelSecondary . FILTER(LANG(?labelSecondary) = "{secondary}") }}
  OPTIONAL {{ wd:{qid} wdt:P569 ?birth . }}
  OPTIONAL {{ wd:{qid} wdt:P570 ?death . }}
  OPTIONAL {{ wd:{qid} wdt:P22 ?father . }}
  OPTIONAL {{ wd:{qid} wdt:P25 ?mother . }}
  OPTIONAL {{
    wd:{qid} wdt:P19 ?birthPlace .
    ?birthPlace rdfs:label ?birthPlaceLabel .
    FILTER(LANG(?birthPlaceLabel) = "{primary}")
  }}
}}
LIMIT 1
"#
    )
}

fn children_query(qid: &Qid) -> String {
    format!(
        r#"SELECT ?child
WHERE {{
  wd:{qid} wdt:P40 ?child .
}}
ORDER BY ?child
"#
    )
}

fn literal(binding: &Binding, key: &str) -> Option<String> {
    binding.get(key).map(|v| v.value.clone())
}

/// Entity URI reduced to its identifier; anything that is not a valid
/// item identifier (blank nodes, lexemes) is dropped.
fn entity_value(binding: &Binding, key: &str) -> Option<Qid> {
    let raw = binding.get(key)?;
    match Qid::parse(&raw.value) {
        Ok(qid) => Some(qid),
        Err(_) => {
            log::debug!("Ignoring non-item value for {}: {}", key, raw.value);
            None
        }
    }
}

fn person_from_binding(qid: &Qid, binding: &Binding) -> Person {
    Person {
        qid: qid.clone(),
        primary_label: literal(binding, "labelPrimary"),
        secondary_label: literal(binding, "labelSecondary"),
        birth: literal(binding, "birth").and_then(|v| parse_iso_date(&v)),
        death: literal(binding, "death").and_then(|v| parse_iso_date(&v)),
        father: entity_value(binding, "father"),
        mother: entity_value(binding, "mother"),
        birthplace_label: literal(binding, "birthPlaceLabel"),
    }
}
