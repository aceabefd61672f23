//! Technology news collector.
//!
//! The autonomy driver creates this collector on demand; its catalog is a
//! small fixed list of emerging-technology concepts.

use crate::record::{parse_sections, Section};
use crate::registry::Collector;
use panini_core::Result;

const CATALOG: &str = include_str!("../../data/news.json");

pub struct NewsCollector;

impl Collector for NewsCollector {
    fn name(&self) -> &str {
        "news"
    }

    fn source_agent(&self) -> &str {
        "autonomous_news_collector"
    }

    fn atom_prefix(&self) -> &str {
        "news"
    }

    fn description(&self) -> &str {
        "Collecte autonome actualités technologiques"
    }

    fn source_type(&self) -> &str {
        "news_feeds"
    }

    fn collection_method(&self, _section: &str) -> String {
        "simulated_news_aggregation".into()
    }

    fn sections(&self) -> Result<Vec<Section>> {
        parse_sections(self.name(), CATALOG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    #[test]
    fn five_tech_concepts() {
        let atoms = NewsCollector.collect(Local::now()).unwrap();
        let concepts: Vec<&str> = atoms.iter().map(|a| a.concept.as_str()).collect();
        assert_eq!(
            concepts,
            [
                "Quantum Computing",
                "Edge AI",
                "Neuromorphic Computing",
                "Federated Learning",
                "Homomorphic Encryption"
            ]
        );
        assert_eq!(atoms[1].provenance.extraction_confidence, 0.88);
        assert_eq!(atoms[0].provenance.collection_method, "simulated_news_aggregation");
        assert!(atoms[4].atom_id().ends_with("_tech_concepts_004"));
    }
}
