pub mod page_extractor;
