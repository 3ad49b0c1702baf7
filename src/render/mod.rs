mod mermaid;

pub use mermaid::{extract_diagram_block, roadmap_flowchart, strip_diagram_blocks};
