mod ingest;
mod resolver;
