mod streaming;
