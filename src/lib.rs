//! jobsift: question answering over a folder of job descriptions
//!
//! Ingestion loads text files, splits them into overlapping chunks, embeds the
//! chunks and writes them to a vector store. Questions are answered by
//! retrieving matching chunks and asking a chat model to answer from them.

pub mod api_client;
pub mod chunk;
pub mod commands;
pub mod config;
pub mod embed;
pub mod error;
pub mod llm;
pub mod load;
pub mod pipeline;
pub mod progress;
pub mod store;

#[cfg(test)]
mod testing;
