//! Prompt templates for the three generation stages.

use super::narrative::{
    BUSINESS_CONTEXT_HEADERS, COMPANY_PROFILE_HEADERS, METHODOLOGY_HEADERS, SOLUTION_HEADERS,
};
use super::stages::NarrativeInput;
use crate::config::NarrativeMinimums;
use crate::knowledge::{CompanyContext, ContextBundle};
use crate::rag::VectorSearchResult;
use crate::text::{bullet_list, format_usd, or_default};

const NONE_RETRIEVED: &str = "(none retrieved)";

fn section(hits: &[VectorSearchResult], line: impl Fn(&VectorSearchResult) -> String) -> String {
    if hits.is_empty() {
        return NONE_RETRIEVED.to_string();
    }
    hits.iter().map(line).collect::<Vec<_>>().join("\n")
}

fn meta<'a>(hit: &'a VectorSearchResult, key: &str) -> &'a str {
    hit.meta_str(key).unwrap_or("unknown")
}

/// The shared context block: company profile plus everything retrieved.
pub(crate) fn context_prompt(company: &CompanyContext, bundle: &ContextBundle, vendor: &str) -> String {
    let mut prompt = format!(
        "# COMPANY PROFILE\n\
         Name: {}\n\
         Industry: {}\n\
         Size: {}\n\
         Region: {}\n\
         Business Challenges: {}\n\
         Current Systems: {}\n\
         Budget: {}\n\
         Timeline: {}\n",
        company.name,
        company.industry,
        company.size,
        company.region,
        or_default(company.challenges.as_deref(), "To be determined"),
        or_default(company.current_systems.as_deref(), "Legacy systems"),
        or_default(company.budget.as_deref(), "To be determined"),
        or_default(company.timeline.as_deref(), "Flexible"),
    );

    prompt.push_str(&format!(
        "\n# RELEVANT {} PRODUCTS (retrieved from the knowledge base)\n{}\n",
        vendor.to_uppercase(),
        section(&bundle.relevant_products, |hit| format!("- {}: {}", meta(hit, "product_name"), hit.content)),
    ));
    prompt.push_str(&format!(
        "\n# INDUSTRY INSIGHTS\n{}\n",
        section(&bundle.industry_insights, |hit| format!("- {}: {}", meta(hit, "category"), hit.content)),
    ));
    prompt.push_str(&format!(
        "\n# IMPLEMENTATION GUIDANCE\n{}\n",
        section(&bundle.implementation_guidance, |hit| format!("- {}", hit.content)),
    ));
    prompt.push_str(&format!(
        "\n# SIMILAR COMPANY PROFILES\n{}\n",
        section(&bundle.company_profiles, |hit| {
            format!("- {} ({}): {}", meta(hit, "company_name"), meta(hit, "industry"), hit.content)
        }),
    ));
    prompt.push_str(&format!(
        "\n# RELEVANT FILE CONTENT\n{}\n",
        section(&bundle.relevant_files, |hit| format!("- {}: {}", meta(hit, "file_name"), hit.content)),
    ));

    if let Some(content) = &bundle.file_content {
        prompt.push_str(&format!("\n# UPLOADED DOCUMENTS\n{content}\n"));
    }

    if let Some(pipeline) = company.pipeline() {
        prompt.push_str(&format!(
            "\n# DEAL PIPELINE CONTEXT\n\
             Total Pipeline Value: {}\n\
             Average Deal Value: {}\n\
             Number of Deals: {}\n",
            format_usd(pipeline.total_value),
            format_usd(pipeline.average_value),
            pipeline.deal_count,
        ));
    }
    prompt
}

/// Stage one: the recommended solutions array.
pub(crate) fn solutions_prompt(context: &str, catalog: &[&str], vendor: &str) -> String {
    let module_rule = if catalog.is_empty() {
        format!("- module (string): a real {vendor} product suited to this company")
    } else {
        format!(
            "- module (string): MUST be exactly one of these retrieved products:\n{}",
            bullet_list(catalog)
        )
    };
    let sections = SOLUTION_HEADERS
        .iter()
        .enumerate()
        .map(|(i, header)| format!("{}) {header}", i + 1))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "# CONTEXT FROM KNOWLEDGE BASE\n{context}\n\
         # TASK\n\
         Recommend the {vendor} modules this company should buy. For each module provide:\n\
         {module_rule}\n\
         - fitJustification (string, 5+ sentences tied to the company data and retrieved context)\n\
         - fitScore (number 0-100) or fit (\"High\", \"Medium\" or \"Low\")\n\
         - estimatedROI (number, percent, e.g. 18.5)\n\
         - timeToValue (string, e.g. \"9-15 months\")\n\
         - estimatedCostMin and estimatedCostMax (numbers, USD)\n\
         - keyBenefits (array of 3+ strings)\n\
         - implementationComplexity (string)\n\
         - technicalRequirements (array of strings)\n\
         - businessImpact (string)\n\
         - riskMitigation (array of 3+ strings)\n\
         - successMetrics (array of 3+ measurable strings)\n\
         - moduleAnalysisContext (string, 1200+ characters, a formal report naming the module \
         throughout, with these ALL CAPS section headings each followed by a colon: {sections}; \
         separate sections with blank lines and use • bullets for lists)\n\n\
         Every figure must be estimated for this company from the profile, the retrieved context \
         and the deal pipeline. Do not use placeholder, zero or null values.\n\n\
         Return ONLY a valid JSON array of these objects, with no explanation and no Markdown."
    )
}

/// Stage two: the business challenges array.
pub(crate) fn challenges_prompt(context: &str, vendor: &str, min_chars: usize) -> String {
    format!(
        "# CONTEXT FROM KNOWLEDGE BASE\n{context}\n\
         # TASK\n\
         Identify 3-5 business challenges this company faces that {vendor} solutions can address. \
         Each challenge must be a single string of at least {min_chars} characters that names the \
         affected business process, the current pain points, the impact on performance or \
         competitive position, how {vendor} capabilities align, and the industry context. \
         Reference the company's own systems, budget and timeline where relevant.\n\n\
         Example: \"The manufacturing division runs disconnected supply chain systems that cause \
         15% production delays. Manual demand forecasting leads to stock-outs and excess inventory, \
         eroding margins in a consolidating market.\"\n\n\
         Return ONLY a valid JSON array of strings, with no explanation and no Markdown."
    )
}

fn headed(headers: &[&str]) -> String {
    headers.join(", ")
}

/// Stage three: the narrative object, written around the validated output
/// of the first two stages.
pub(crate) fn narrative_prompt(
    context: &str,
    input: &NarrativeInput<'_>,
    vendor: &str,
    minimums: &NarrativeMinimums,
) -> String {
    format!(
        "# CONTEXT FROM KNOWLEDGE BASE\n{context}\n\
         # ALREADY GENERATED\n\
         Recommended Solutions:\n{solutions}\n\n\
         Business Challenges:\n{challenges}\n\n\
         # TASK\n\
         Write the rest of the analysis as one JSON object with these fields. Build on the \
         solutions and challenges above; do not repeat or change them.\n\
         - companyProfileAnalysis (string, {profile}+ characters, with ALL CAPS headings followed by a colon: {profile_headers})\n\
         - businessContextAnalysis (string, {context_min}+ characters, headings: {context_headers})\n\
         - analysisMethodology (string, {method}+ characters, headings: {method_headers})\n\
         - businessCase (object: totalInvestment, projectedSavings (annual), paybackPeriod (string), \
         netPresentValue (5 years at 8%), riskAdjustedROI (percent); numbers in USD)\n\
         - financialAnalysis (object: investmentCalculation, savingsProjection, roiAnalysis)\n\
         - implementationRoadmap (array of 5-7 phases: phase, duration, activities, deliverables, \
         resources, calculatedCost, solutions (module names from the recommended solutions))\n\
         - competitiveAnalysis (object: vendorAdvantages (array), competitorComparison (object of \
         competitor to comparison), differentiators (array))\n\
         - keySuccessFactors (array of 3-5 strings)\n\
         - riskFactors (array of 4-6 strings)\n\
         - nextSteps (array of 3-5 actionable strings)\n\
         - executiveSummary (string, 200+ characters)\n\n\
         Base every figure on the company profile and the retrieved {vendor} knowledge.\n\n\
         Return ONLY the JSON object, with no explanation and no Markdown.",
        solutions = input.solutions_json(),
        challenges = input.challenges_json(),
        profile = minimums.company_profile,
        profile_headers = headed(&COMPANY_PROFILE_HEADERS),
        context_min = minimums.business_context,
        context_headers = headed(&BUSINESS_CONTEXT_HEADERS),
        method = minimums.methodology,
        method_headers = headed(&METHODOLOGY_HEADERS),
    )
}
