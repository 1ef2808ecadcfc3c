//! Prompt templates. Replies are requested in Russian so that the
//! `has_cyrillic` check can tell a real answer from an error message.

pub fn continue_dialogue(context: &str) -> String {
    format!(
        "Context of the previous discussion:
{context}

Please continue the dialogue, considering the following requirements:
1. The response must be in Russian
2. The response must be related to previous messages
3. Provide a constructive suggestion or idea
4. Response length - no more than 2-3 sentences"
    )
}

pub fn propose_aspect(task: &str, aspect: &str) -> String {
    format!(
        "{task}

Please propose a solution for the following aspect: {aspect}

Requirements for the response:
1. The response must be in Russian
2. Provide a specific solution
3. Explain how it will help in children's education
4. Response length - 2-3 sentences"
    )
}

/// `solutions` are `(label, reply)` pairs in proposal order.
pub fn synthesize(solutions: &[(String, String)]) -> String {
    let proposed = solutions
        .iter()
        .map(|(label, reply)| format!("{} solution: {}", label, reply))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze the proposed solutions and suggest how they can be combined:
{proposed}

Requirements for the response:
1. The response must be in Russian
2. Propose a concrete plan for combining the solutions
3. Indicate the advantages of such a combination
4. Response length - 3-4 sentences"
    )
}
