/// Data for the /v1/models endpoint.
/// This endpoint mimics the openai API's models endpoint. The catalog is fixed at build time; it
/// is not queried from the backend and model ids in requests are not checked against it.
use serde::{Deserialize, Serialize};

/// Creation timestamp reported for every catalog entry.
const CATALOG_CREATED: u64 = 1_700_000_000;

/// `(id, owned_by)` for each advertised model, in listing order.
const CATALOG: [(&str, &str); 5] = [
    ("@cf/meta/llama-3.3-70b-instruct-fp8-fast", "meta"),
    ("@cf/meta/llama-3.1-8b-instruct", "meta"),
    ("@cf/mistral/mistral-7b-instruct-v0.1", "mistral"),
    ("@cf/qwen/qwen1.5-14b-chat-awq", "qwen"),
    ("@cf/baai/bge-large-en-v1.5", "baai"),
];

/// The returned models from the /v1/models endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Model {
    /// The model identifier, which can be referenced in the API endpoints.
    pub id: String,
    /// The object type, which is always "model".
    pub object: String,
    /// The Unix timestamp (in seconds) when the model was created.
    pub created: u64,
    /// The organization that owns the model.
    pub owned_by: String,
}

/// The response from the /v1/models endpoint, which is a list of models.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ListModelResponse {
    /// The object type, which is always "list".
    pub object: String,
    /// A list of model objects.
    pub data: Vec<Model>,
}

impl ListModelResponse {
    pub fn catalog() -> Self {
        let data = CATALOG
            .iter()
            .map(|(id, owned_by)| Model {
                id: (*id).to_string(),
                object: "model".into(),
                created: CATALOG_CREATED,
                owned_by: (*owned_by).to_string(),
            })
            .collect::<Vec<_>>();

        ListModelResponse {
            object: "list".into(),
            data,
        }
    }
}
