//! Grounded prompt construction.

/// Answer given when the context does not contain the answer.
pub const NOT_IN_CONTEXT_ANSWER: &str =
    "The information is not available in the provided documents.";

/// Build a prompt that restricts the model to `context` when answering
/// `query`.
pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "You are an intelligent assistant answering questions strictly using the provided context.\n\
         \n\
         Rules:\n\
         - Use only the given context.\n\
         - If the answer is not present, say: \"{NOT_IN_CONTEXT_ANSWER}\"\n\
         - Answer clearly and concisely.\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question:\n\
         {query}\n\
         \n\
         Answer:",
        context = context.trim(),
        query = query.trim(),
    )
}
