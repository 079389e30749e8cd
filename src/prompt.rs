use crate::models::{Conversation, DiversityInput, Ratios};

pub const SYSTEM_PROMPT: &str = "You are an analyst for the Center for Scientific Review committee.";

/// Sent after a reply fails schema validation
pub const CORRECTIVE_PROMPT: &str = "Looks like the output you gave is not properly formatted. Can you modify your response to match the example I gave";

const CONTEXT: &str = "I'm going to give you a document that contains comments about a slate by the evaluating committee.
A slate is the list of nominees and the supporting documentation for proposed new members
of a chartered study section. Nominees are not selected individually, but rather as a set to form a panel that will provide the
fair and expert review.

The Primary requirements for slates:
 1. Scientific expertise
    • Members should collectively cover the topics and methods listed in the study section
guidelines.
    • Individuals with broad expertise are valuable
 2. Multidimensional Diversity
    • Scientific diversity (no single “pedigree” or perspective on a problem)
    • Institutional
    • Personal demographics: gender, race, ethnicity
    • Career stage, review experience
";

const IDEAL_RATIOS: &str = "The ideal percentage of data for each criterion is given in json format below.
{
\t\"URM\": \"20%\",
\t\"Minority\": \"50%\",
\t\"Female\": \"10%\",

\t\"EA\": \"30%\",
\t\"SO\": \"30%\",
\t\"CE\": \"15%\",
\t\"WE\": \"25%\",
\t\"FO\": \"5%\",

\t\"professor\": \"70%\",
\t\"associate professor\": \"20%\",
\t\"assistant professor\": \"10%\"
}
";

const TASK: &str = r#"The deviation from the ideal values should be considered to see whether the criterion is satisfied or not.

The demographic diversity criteria include URM, Minority and Female,
The geographic diversity criteria include EA, SO, CE, WE, and FO.
The seniority/career phase criterion include professor,associate professor,and assistant professor.

For each of the criterion given in the json format,do the following two operations:
1. Check whether any plan of action is stated in the workflow data given in <document> and </document> if the actual and ideal values are deviated.
2. Find the sentiment for the plan of action as "Positive" or "Negative".
If actual and ideal data are same, give: Plan of action as "Criterion satisfied" and sentiment as "Healthy". In case there is a plan of action given in workflow, provide that information. Also,
If there is no plan of action provided for a deviant criterion, give plan of action as "No information provided", sentiment:"Negative".
3.The rating value for healthy, positive and negative are 3, 2 and 1 respectively.
4. Calculate the average rating of the demographic diversity, geographic diversity, seniority/career phase criterion and overall average.
5. Based on the Plan of action of each criterion, Summarise your analysis.

The format of your overall response should look like what's shown between the <example> tags. Make sure to follow the formatting and spacing exactly.
Answer immediately without preamble, do not include anything other than the json in your final response.

<example>
{
    "Demographic Diversity": {
        "URM": {
            "plan of action": "",
            "sentiment": "",
            "rating": ""
        },
        "Minority": {
            "plan of action": "",
            "sentiment": "",
            "rating": ""
        },
        "Female": {
            "plan of action": "",
            "sentiment": "",
            "rating": ""
        },
        "Average Rating": ""
    },
    "Geographic Diversity": {
        "EA": {
            "plan of action": "",
            "sentiment": "",
            "rating": ""
        },
        "SO": {
            "plan of action": "",
            "sentiment": "",
            "rating": ""
        },
        "CE": {
            "plan of action": "",
            "sentiment": "",
            "rating": ""
        },
        "WE": {
            "plan of action": "",
            "sentiment": "",
            "rating": ""
        },
        "FO": {
            "plan of action": "",
            "sentiment": "",
            "rating": ""
        },
        "Average Rating": ""
    },
    "Seniority/Career Phase": {
        "professor": {
            "plan of action": "",
            "sentiment": "",
            "rating": ""
        },
        "associate professor": {
            "plan of action": "",
            "sentiment": "",
            "rating": ""
        },
        "assistant professor": {
            "plan of action": "",
            "sentiment": "",
            "rating": ""
        },
        "Average Rating": ""
    },
    "Overall Rating": "",
    "Summary": ""
}
</example>


The workflow is given below in <document> and </document>
"#;

/// Build the opening `[system, user]` conversation for a slate.
///
/// Pure and deterministic: identical input always yields byte-identical
/// messages.
pub fn build_conversation(input: &DiversityInput) -> Conversation {
    Conversation::new(SYSTEM_PROMPT, build_user_prompt(input))
}

fn build_user_prompt(input: &DiversityInput) -> String {
    format!(
        "\n{}\n{}\n{}\n{}\n<document>{}</document>\n",
        CONTEXT,
        IDEAL_RATIOS,
        actual_ratios_block(&input.ratios),
        TASK,
        input.workflow
    )
}

/// Actual percentages in the same layout as the ideal table
fn actual_ratios_block(ratios: &Ratios) -> String {
    let mut block = String::from("The percentage of data for each criterion are given in json format below.\n{\n");
    let labeled = ratios.labeled();
    for (index, (key, value)) in labeled.iter().enumerate() {
        // blank lines separate the three categories, matching the ideal table
        if index == 3 || index == 8 {
            block.push('\n');
        }
        let separator = if index + 1 == labeled.len() { "" } else { "," };
        block.push_str(&format!("\t\"{}\": \"{}%\"{}\n", key, value, separator));
    }
    block.push_str("}\n");
    block
}
