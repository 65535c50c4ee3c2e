use std::{io::Write, sync::Arc};

use course_search::{
   Error,
   catalog::CatalogIndex,
   embed::{Embedder, HashingEmbedder},
   ingest,
   search::SearchEngine,
};

const CATALOG: &str = r#"Course Name,Key Takeaways,Course Time,Ratings,Difficulty,Description,Website
Free Machine Learning Fundamentals,"Learn ML fundamentals.,Supervised and unsupervised algorithms",3,4.7,Beginner,Intro,https://courses.example.com/free-ml
Free Cooking at Home,"Knife skills.,Soups and stews",1,4.5,Beginner,Food,https://courses.example.com/free-cooking
Free Graph Databases,"Nodes and edges.,Cypher queries",2,4.4,Intermediate,Graphs,https://courses.example.com/free-graphs
Certified Data Science Program,"Everything.,Capstone",40,4.9,Advanced,Paid,https://courses.example.com/paid
"#;

async fn engine_from_csv(csv: &str) -> SearchEngine {
   let mut file = tempfile::NamedTempFile::new().unwrap();
   file.write_all(csv.as_bytes()).unwrap();

   let rows = ingest::read_csv(file.path()).unwrap();
   let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(384));
   let index = CatalogIndex::build(rows, &embedder).await.unwrap();

   SearchEngine::new(Arc::new(index), embedder)
}

#[tokio::test]
async fn test_end_to_end_machine_learning_query() {
   let engine = engine_from_csv(CATALOG).await;
   assert_eq!(engine.index().len(), 3);

   let results = engine.search_ranked("learn ML fundamentals", 2).await.unwrap();
   assert_eq!(results.len(), 2);
   assert_eq!(results[0].record.name, "Free Machine Learning Fundamentals");
   assert!(results[0].score >= results[1].score);

   let report = engine.search("learn ML fundamentals", 2).await.unwrap();
   assert!(report.contains("2 relevant free courses"));
   assert!(report.contains("'learn ML fundamentals'"));
   assert!(report.contains("**1. Free Machine Learning Fundamentals**"));
   assert!(report.contains("**2. "));
   assert!(!report.contains("**3. "));
   assert!(report.contains("[Start Course](https://courses.example.com/free-ml)"));
}

#[tokio::test]
async fn test_top_k_larger_than_catalog() {
   let engine = engine_from_csv(CATALOG).await;

   let results = engine.search_ranked("graph databases", 10).await.unwrap();
   assert_eq!(results.len(), 3);
   assert_eq!(results[0].record.name, "Free Graph Databases");
   assert!(results.iter().all(|r| r.record.name.contains("Free")));
}

#[tokio::test]
async fn test_single_result_uses_singular_header() {
   let engine = engine_from_csv(CATALOG).await;

   let report = engine.search("knife skills, soups", 1).await.unwrap();
   assert!(report.starts_with("I found an excellent free course matching your search for 'knife skills, soups':"));
   assert!(report.contains("**1. Free Cooking at Home**"));
}

#[tokio::test]
async fn test_catalog_without_free_courses_fails() {
   let csv = "Course Name,Website\nPaid Bootcamp,https://courses.example.com/paid\n";
   let mut file = tempfile::NamedTempFile::new().unwrap();
   file.write_all(csv.as_bytes()).unwrap();

   let rows = ingest::read_csv(file.path()).unwrap();
   let err = CatalogIndex::build(rows, &HashingEmbedder::new(16)).await.unwrap_err();

   assert!(matches!(err, Error::EmptyCorpus { rows: 1 }));
}

#[tokio::test]
async fn test_concurrent_searches_share_engine() {
   let engine = Arc::new(engine_from_csv(CATALOG).await);

   let handles: Vec<_> = ["machine learning", "cooking soups", "graph databases"]
      .into_iter()
      .map(|query| {
         let engine = Arc::clone(&engine);
         tokio::spawn(async move { engine.search_ranked(query, 1).await.unwrap() })
      })
      .collect();

   let mut top = Vec::new();
   for handle in handles {
      top.push(handle.await.unwrap()[0].record.name.clone());
   }

   assert_eq!(
      top,
      ["Free Machine Learning Fundamentals", "Free Cooking at Home", "Free Graph Databases"]
   );
}
