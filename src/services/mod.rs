/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Conditions raised by the scoring facade.
pub mod notifications;
/// Per-match scoring facade.
pub mod scorer;
/// Registry-level operations behind the match routes.
pub mod scoring_service;
/// Server-Sent Events notice streaming.
pub mod sse_service;
