use crate::knowledge::RoadmapPhase;

const FENCE: &str = "```";
const DIAGRAM_LANGUAGE: &str = "mermaid";
const MAX_LABEL_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FencedBlock<'a> {
    /// Line index of the opening fence.
    open: usize,
    /// Line index of the closing fence.
    close: usize,
    /// Body text sharing the closing line, as in `A-->B```.
    tail: &'a str,
    is_diagram: bool,
}

/// Text before a closing run of three or more backticks.
fn closing_fence(line: &str) -> Option<&str> {
    let trimmed = line.trim_end();
    let body = trimmed.trim_end_matches('`');
    (trimmed.len() - body.len() >= FENCE.len()).then_some(body)
}

/// Walks the fenced blocks of `lines`; an unterminated fence ends the scan.
fn fenced_blocks<'a>(lines: &[&'a str]) -> Vec<FencedBlock<'a>> {
    let mut blocks = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let Some(info) = lines[index].trim_start().strip_prefix(FENCE) else {
            index += 1;
            continue;
        };
        let language = info
            .trim_start_matches('`')
            .split_whitespace()
            .next()
            .unwrap_or_default();

        let Some((offset, tail)) = lines[index + 1..]
            .iter()
            .enumerate()
            .find_map(|(offset, line)| closing_fence(line).map(|tail| (offset, tail)))
        else {
            break;
        };
        let close = index + 1 + offset;

        blocks.push(FencedBlock {
            open: index,
            close,
            tail,
            is_diagram: language.eq_ignore_ascii_case(DIAGRAM_LANGUAGE),
        });
        index = close + 1;
    }

    blocks
}

/// Trimmed body of the first ```mermaid block, if one is closed.
pub fn extract_diagram_block(text: &str) -> Option<String> {
    let lines = text.lines().collect::<Vec<_>>();
    let block = fenced_blocks(&lines)
        .into_iter()
        .find(|block| block.is_diagram)?;

    let mut body = lines[block.open + 1..block.close].to_vec();
    body.push(block.tail);
    Some(body.join("\n").trim().to_string())
}

/// The text with every closed mermaid block removed.
pub fn strip_diagram_blocks(text: &str) -> String {
    let lines = text.lines().collect::<Vec<_>>();
    let diagrams = fenced_blocks(&lines)
        .into_iter()
        .filter(|block| block.is_diagram)
        .collect::<Vec<_>>();
    if diagrams.is_empty() {
        return text.trim_end().to_string();
    }

    lines
        .iter()
        .enumerate()
        .filter(|(index, _)| {
            !diagrams
                .iter()
                .any(|block| (block.open..=block.close).contains(index))
        })
        .map(|(_, line)| *line)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

/// Top-down mermaid flowchart chaining the roadmap phases.
pub fn roadmap_flowchart(phases: &[RoadmapPhase]) -> String {
    let mut chart = String::from("graph TD");
    for (index, phase) in phases.iter().enumerate() {
        let label = shorten(
            &format!("{} - {}", phase.phase, phase.focus),
            MAX_LABEL_CHARS,
        );
        chart.push_str(&format!(
            "\n    P{}[\"{}\"]",
            index + 1,
            label.replace('"', "#quot;")
        ));
    }
    for index in 1..phases.len() {
        chart.push_str(&format!("\n    P{index} --> P{}", index + 1));
    }
    chart
}

/// Collapses whitespace and cuts at a word boundary, marking the cut with `...`.
fn shorten(text: &str, width: usize) -> String {
    let words = text.split_whitespace().collect::<Vec<_>>();
    let collapsed = words.join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }

    let mut out = String::new();
    for word in words {
        let extra = if out.is_empty() { 0 } else { 1 };
        if out.chars().count() + extra + word.chars().count() + 4 > width {
            break;
        }
        if extra == 1 {
            out.push(' ');
        }
        out.push_str(word);
    }
    out.push_str(" ...");
    out
}
