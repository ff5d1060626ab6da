//! # DietMate Tools
//!
//! The two capabilities exposed uniformly to every diet agent:
//! `search_knowledge` (filtered retrieval from the recipe index) and
//! `web_search` (Tavily). Each tool is constructed with its backing service
//! already bound; a tool whose backing was never provided fails with
//! `NotConfigured` when invoked, without ever aborting the process.

pub mod knowledge_search;
pub mod registry;
pub mod web_search;

pub use knowledge_search::KnowledgeSearchTool;
pub use registry::ToolRegistry;
pub use web_search::WebSearchTool;
