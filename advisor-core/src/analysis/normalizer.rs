//! Turns validated stage outputs into a complete [`AnalysisResult`].
//!
//! Nothing here fails: every gap is filled from retrieved product metadata,
//! from the fixed financial model, or from defaults.

use super::drafts::{
    BusinessCaseDraft, CompetitiveAnalysisDraft, FinancialAnalysisDraft, NarrativeDraft, RoadmapPhaseDraft,
};
use super::fit_score::{normalize_product_name, ScoredSolution};
use super::lenient::parse_number;
use super::narrative::{
    NarrativeFormatter, BUSINESS_CONTEXT_HEADERS, COMPANY_PROFILE_HEADERS, METHODOLOGY_HEADERS,
    SOLUTION_HEADERS,
};
use super::stages::ChallengeEntry;
use super::types::{
    AnalysisResult, BusinessCase, CompetitiveAnalysis, FinancialAnalysis, OverallFit,
    RecommendedSolution, RoadmapPhase,
};
use super::usage::UsageLedger;
use crate::knowledge::{CompanyContext, ContextBundle};
use crate::rag::VectorSearchResult;
use crate::text::format_usd;
use serde_json::Value;

const DEFAULT_INVESTMENT: f64 = 1_500_000.0;
const DEFAULT_SAVINGS_RATIO: f64 = 0.3;
const DISCOUNT_RATE: f64 = 0.08;
const NPV_YEARS: i32 = 5;
/// NPV targeted, as a share of investment, when savings must be raised.
const NPV_TARGET_RATIO: f64 = 0.15;
const ROI_FLOOR: f64 = 15.0;

const DEFAULT_SOLUTION_ROI: f64 = 20.0;
const DEFAULT_TIME_TO_VALUE: &str = "6-12 months";
const DEFAULT_COST_MIN: f64 = 250_000.0;
const DEFAULT_COST_MAX: f64 = 500_000.0;

/// Phase name, duration, share of total investment.
const ROADMAP_TEMPLATE: [(&str, &str, f64); 5] = [
    ("Discovery & Planning", "4-6 weeks", 0.10),
    ("Design & Configuration", "8-12 weeks", 0.15),
    ("Build & Integration", "12-16 weeks", 0.40),
    ("Testing & Training", "6-8 weeks", 0.20),
    ("Deployment & Hypercare", "4-6 weeks", 0.15),
];

/// One challenge as a single sentence.
///
/// Structured challenges are joined field by field, each missing field
/// replaced by its label. Anything that is neither text nor an object
/// becomes a generic sentence.
pub(crate) fn coerce_challenge(entry: ChallengeEntry, vendor: &str) -> String {
    match entry {
        ChallengeEntry::Text(text) => text.trim().to_string(),
        ChallengeEntry::Structured(fields) => format!(
            "{}: {} - {} - {} - {}",
            fields.business_process.as_deref().unwrap_or("Business Process"),
            fields.pain_points.as_deref().unwrap_or("Pain points"),
            fields.impact.as_deref().unwrap_or("Impact"),
            fields
                .vendor_alignment
                .unwrap_or_else(|| format!("{vendor} alignment")),
            fields.industry_context.as_deref().unwrap_or("Industry context"),
        ),
        ChallengeEntry::Other(_) => format!("Business challenge requiring {vendor} solution implementation"),
    }
}

fn annuity_factor() -> f64 {
    (1..=NPV_YEARS)
        .map(|year| 1.0 / (1.0 + DISCOUNT_RATE).powi(year))
        .sum()
}

/// Five-year NPV of constant annual savings against an upfront
/// investment, rounded to whole dollars.
pub fn net_present_value(investment: f64, annual_savings: f64) -> f64 {
    (annual_savings * annuity_factor() - investment).round()
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn bounded_roi(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite()).map(|v| {
        if v < 0.0 {
            25.0
        } else if v > 100.0 {
            50.0
        } else {
            v.round()
        }
    })
    .filter(|v| *v > 0.0)
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Completes a generated business case.
///
/// Alternative field names win over the canonical ones when present:
/// `totalEstimatedCost`, then the midpoint of `estimatedCostMin`/`Max`, for
/// the investment; `totalEstimatedROI`/`estimatedROI` (negative read as 25,
/// above 100 as 50, zero read as missing) for the ROI;
/// `totalTimeToValue`/`timeToValue` for the payback period.
///
/// Missing figures come from a fixed model: a $1.5M investment, annual
/// savings of 30% of it, and a five-year NPV at 8%. When the savings give a
/// non-positive NPV, they are raised until the NPV is 15% of the investment.
/// The ROI is never computed below 15% and the payback period is 1 to 5
/// years.
pub fn fill_business_case_fallbacks(draft: &BusinessCaseDraft) -> BusinessCase {
    let midpoint = match (positive(draft.estimated_cost_min), positive(draft.estimated_cost_max)) {
        (Some(min), Some(max)) => Some(((min + max) / 2.0).round()),
        _ => None,
    };
    let investment = positive(draft.total_estimated_cost)
        .or(midpoint)
        .or(positive(draft.total_investment))
        .unwrap_or(DEFAULT_INVESTMENT);

    let mut savings =
        positive(draft.projected_savings).unwrap_or_else(|| (investment * DEFAULT_SAVINGS_RATIO).round());

    let mut npv = net_present_value(investment, savings);
    if npv > 0.0 {
        if let Some(stated) = positive(draft.net_present_value) {
            npv = stated;
        }
    } else {
        savings = ((investment * (1.0 + NPV_TARGET_RATIO)) / annuity_factor()).ceil();
        npv = net_present_value(investment, savings);
    }

    let risk_adjusted_roi = bounded_roi(draft.total_estimated_roi)
        .or(bounded_roi(draft.estimated_roi))
        .or(positive(draft.risk_adjusted_roi))
        .unwrap_or_else(|| (savings / investment * 100.0).round().max(ROI_FLOOR));

    let payback_period = non_blank(draft.total_time_to_value.as_ref())
        .or_else(|| non_blank(draft.time_to_value.as_ref()))
        .or_else(|| non_blank(draft.payback_period.as_ref()))
        .unwrap_or_else(|| {
            let years = ((investment / savings) * 10.0).round() / 10.0;
            format!("{} years", years.clamp(1.0, 5.0))
        });

    BusinessCase {
        total_investment: investment,
        projected_savings: savings,
        payback_period,
        net_present_value: npv,
        risk_adjusted_roi,
    }
}

/// Stage outputs ready to be assembled.
pub(crate) struct GeneratedAnalysis {
    pub(crate) ranked: Vec<ScoredSolution>,
    pub(crate) fit_score: f64,
    pub(crate) overall_fit: OverallFit,
    pub(crate) challenges: Vec<String>,
    pub(crate) narrative: NarrativeDraft,
}

/// Fills and formats everything the generator left out.
#[derive(Debug, Clone)]
pub struct ResultNormalizer {
    vendor: String,
    formatter: NarrativeFormatter,
}

impl ResultNormalizer {
    /// `format_min_chars`: narrative strings shorter than this keep their
    /// original layout.
    pub fn new(vendor: impl Into<String>, format_min_chars: usize) -> Self {
        Self {
            vendor: vendor.into(),
            formatter: NarrativeFormatter::new(format_min_chars),
        }
    }

    pub(crate) fn normalize(
        &self,
        company: &CompanyContext,
        bundle: &ContextBundle,
        generated: GeneratedAnalysis,
        usage: UsageLedger,
    ) -> AnalysisResult {
        let GeneratedAnalysis {
            ranked,
            fit_score,
            overall_fit,
            challenges,
            narrative,
        } = generated;

        let solutions: Vec<RecommendedSolution> = ranked
            .into_iter()
            .map(|scored| self.solution(company, bundle, scored))
            .collect();
        let modules: Vec<String> = solutions.iter().map(|s| s.module.clone()).collect();

        let business_case = fill_business_case_fallbacks(&narrative.business_case);
        let financial_analysis = financial_analysis(narrative.financial_analysis, &business_case, modules.len());
        let implementation_roadmap = roadmap(narrative.implementation_roadmap, &modules, business_case.total_investment);
        let competitive_analysis = self.competitive_analysis(narrative.competitive_analysis, modules.len());

        let executive_summary = if narrative.executive_summary.trim().is_empty() {
            self.executive_summary(company, &solutions, fit_score, overall_fit, &business_case)
        } else {
            narrative.executive_summary.trim().to_string()
        };

        AnalysisResult {
            company_name: company.name.clone(),
            recommended_solutions: solutions,
            business_challenges: challenges,
            fit_score,
            overall_fit,
            company_profile_analysis: self
                .formatter
                .format(&narrative.company_profile_analysis, &COMPANY_PROFILE_HEADERS),
            business_context_analysis: self
                .formatter
                .format(&narrative.business_context_analysis, &BUSINESS_CONTEXT_HEADERS),
            analysis_methodology: self
                .formatter
                .format(&narrative.analysis_methodology, &METHODOLOGY_HEADERS),
            key_success_factors: or_defaults(narrative.key_success_factors, default_success_factors),
            business_case,
            financial_analysis,
            implementation_roadmap,
            competitive_analysis,
            risk_factors: or_defaults(narrative.risk_factors, default_risk_factors),
            next_steps: or_defaults(narrative.next_steps, default_next_steps),
            executive_summary,
            usage,
        }
    }

    fn solution(&self, company: &CompanyContext, bundle: &ContextBundle, scored: ScoredSolution) -> RecommendedSolution {
        let ScoredSolution { draft, fit, priority } = scored;
        let product = product_hit(bundle, &draft.module);
        let meta = |key: &str| product.and_then(|hit| hit.meta_str(key));
        let meta_number = |key: &str| product.and_then(|hit| hit.metadata.get(key)).and_then(Value::as_f64);

        let estimated_roi = positive(draft.estimated_roi)
            .or_else(|| meta("roi").and_then(range_midpoint))
            .unwrap_or(DEFAULT_SOLUTION_ROI);
        let time_to_value = draft
            .time_to_value
            .or_else(|| meta("time_to_value").map(str::to_string))
            .unwrap_or_else(|| DEFAULT_TIME_TO_VALUE.to_string());
        let mut cost_min = positive(draft.estimated_cost_min)
            .or_else(|| positive(meta_number("price_min")))
            .unwrap_or(DEFAULT_COST_MIN);
        let mut cost_max = positive(draft.estimated_cost_max)
            .or_else(|| positive(meta_number("price_max")))
            .unwrap_or(cost_min.max(DEFAULT_COST_MAX));
        if cost_min > cost_max {
            std::mem::swap(&mut cost_min, &mut cost_max);
        }

        let fit_justification = if draft.fit_justification.is_empty() {
            format!(
                "{} addresses {}'s {} requirements with a fit score of {}.",
                draft.module, company.name, company.industry, fit.value
            )
        } else {
            draft.fit_justification
        };
        let business_impact = if draft.business_impact.is_empty() {
            format!("Expected ROI of {estimated_roi}% with value realized in {time_to_value}.")
        } else {
            draft.business_impact
        };
        let module_analysis_context = if draft.module_analysis_context.is_empty() {
            format!(
                "EXECUTIVE SUMMARY:\n{fit_justification}\n\nBUSINESS IMPACT & ROI:\n{business_impact}"
            )
        } else {
            self.formatter.format(&draft.module_analysis_context, &SOLUTION_HEADERS)
        };

        RecommendedSolution {
            fit_score: fit.value,
            priority,
            score_source: fit.source,
            retrieval_score: fit.retrieval_score,
            fit_justification,
            estimated_roi,
            time_to_value,
            estimated_cost_min: cost_min,
            estimated_cost_max: cost_max,
            key_benefits: or_defaults(draft.key_benefits, default_benefits),
            implementation_complexity: draft
                .implementation_complexity
                .or_else(|| meta("complexity").map(str::to_string))
                .unwrap_or_else(|| "Medium".to_string()),
            technical_requirements: or_defaults(draft.technical_requirements, default_requirements),
            business_impact,
            risk_mitigation: or_defaults(draft.risk_mitigation, default_risk_mitigation),
            success_metrics: or_defaults(draft.success_metrics, default_success_metrics),
            module_analysis_context,
            module: draft.module,
        }
    }

    fn competitive_analysis(&self, draft: CompetitiveAnalysisDraft, module_count: usize) -> CompetitiveAnalysis {
        let vendor = &self.vendor;
        CompetitiveAnalysis {
            vendor_advantages: or_defaults(draft.advantages, || {
                vec![
                    format!("Integrated {vendor} platform across {module_count} recommended modules"),
                    "Industry best practices delivered in standard processes".to_string(),
                    format!("Established {vendor} partner ecosystem and implementation methodology"),
                ]
            }),
            competitor_comparison: draft.competitor_comparison,
            differentiators: draft.differentiators,
        }
    }

    fn executive_summary(
        &self,
        company: &CompanyContext,
        solutions: &[RecommendedSolution],
        fit_score: f64,
        overall_fit: OverallFit,
        case: &BusinessCase,
    ) -> String {
        let mut summary = format!(
            "{} is a {overall_fit} fit for {} solutions, with an overall fit score of {fit_score}.",
            company.name, self.vendor
        );
        if let Some(first) = solutions.first() {
            summary.push_str(&format!(" The recommended starting point is {}.", first.module));
        }
        summary.push_str(&format!(
            " An investment of {} is projected to save {} a year, for a five-year NPV of {} and payback in {}.",
            format_usd(case.total_investment),
            format_usd(case.projected_savings),
            format_usd(case.net_present_value),
            case.payback_period,
        ));
        summary
    }
}

fn product_hit<'a>(bundle: &'a ContextBundle, module: &str) -> Option<&'a VectorSearchResult> {
    let wanted = normalize_product_name(module);
    bundle.relevant_products.iter().find(|hit| {
        hit.meta_str("product_name")
            .is_some_and(|name| normalize_product_name(name) == wanted)
    })
}

/// Midpoint of `"15-25%"`, or the value of `"20%"`.
fn range_midpoint(range: &str) -> Option<f64> {
    let bounds: Vec<f64> = range
        .split(['-', '–'])
        .filter_map(|part| parse_number(&Value::String(part.to_string())))
        .collect();
    if bounds.is_empty() {
        None
    } else {
        Some(bounds.iter().sum::<f64>() / bounds.len() as f64)
    }
}

fn financial_analysis(
    draft: FinancialAnalysisDraft,
    case: &BusinessCase,
    module_count: usize,
) -> FinancialAnalysis {
    let or_text = |text: String, fallback: String| if text.is_empty() { fallback } else { text };
    FinancialAnalysis {
        investment_calculation: or_text(
            draft.investment_calculation,
            format!(
                "Total investment of {} across {module_count} recommended modules, covering licenses, implementation services and change management.",
                format_usd(case.total_investment)
            ),
        ),
        savings_projection: or_text(
            draft.savings_projection,
            format!(
                "Projected annual savings of {} from process automation and consolidated systems.",
                format_usd(case.projected_savings)
            ),
        ),
        roi_analysis: or_text(
            draft.roi_analysis,
            format!(
                "Risk-adjusted ROI of {}% with payback in {}. Five-year NPV of {} at an 8% discount rate.",
                case.risk_adjusted_roi,
                case.payback_period,
                format_usd(case.net_present_value)
            ),
        ),
    }
}

/// Keeps generated phases, limited to recommended modules, or builds the
/// standard five-phase plan. A phase left naming no recommended module
/// covers all of them.
fn roadmap(phases: Vec<RoadmapPhaseDraft>, modules: &[String], investment: f64) -> Vec<RoadmapPhase> {
    let canonical = |name: &String| {
        let wanted = normalize_product_name(name);
        modules
            .iter()
            .find(|module| normalize_product_name(module) == wanted)
            .cloned()
    };

    if phases.is_empty() {
        return ROADMAP_TEMPLATE
            .iter()
            .map(|(phase, duration, share)| template_phase(phase, duration, (investment * share).round(), modules))
            .collect();
    }

    let count = phases.len();
    phases
        .into_iter()
        .enumerate()
        .map(|(i, draft)| RoadmapPhase {
            phase: if draft.phase.is_empty() {
                format!("Phase {}", i + 1)
            } else {
                draft.phase
            },
            duration: if draft.duration.is_empty() {
                "4-8 weeks".to_string()
            } else {
                draft.duration
            },
            activities: draft.activities,
            deliverables: draft.deliverables,
            resources: draft.resources,
            calculated_cost: positive(draft.calculated_cost)
                .unwrap_or_else(|| (investment / count as f64).round()),
            solutions: or_defaults(draft.solutions.iter().filter_map(&canonical).collect(), || {
                modules.to_vec()
            }),
        })
        .collect()
}

fn template_phase(phase: &str, duration: &str, cost: f64, modules: &[String]) -> RoadmapPhase {
    let (activities, deliverables, resources): (&[&str], &[&str], &[&str]) = match phase {
        "Discovery & Planning" => (
            &["Current-state process assessment", "Scope and success criteria", "Program governance setup"],
            &["Project charter", "Solution scope document"],
            &["Solution architect", "Business process owners"],
        ),
        "Design & Configuration" => (
            &["Fit-to-standard workshops", "Solution design", "Data migration strategy"],
            &["Solution design document", "Configured baseline system"],
            &["Functional consultants", "Key users"],
        ),
        "Build & Integration" => (
            &["Configuration and extensions", "Interface development", "Data migration cycles"],
            &["Integrated solution", "Migrated master data"],
            &["Functional consultants", "Integration developers", "Data team"],
        ),
        "Testing & Training" => (
            &["Integration and user acceptance testing", "End-user training", "Cutover rehearsal"],
            &["Signed-off test results", "Trained users"],
            &["Test team", "Trainers", "Key users"],
        ),
        _ => (
            &["Production cutover", "Hypercare support", "Benefits tracking"],
            &["Live system", "Hypercare report"],
            &["Support team", "Business process owners"],
        ),
    };
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    RoadmapPhase {
        phase: phase.to_string(),
        duration: duration.to_string(),
        activities: owned(activities),
        deliverables: owned(deliverables),
        resources: owned(resources),
        calculated_cost: cost,
        solutions: modules.to_vec(),
    }
}

fn or_defaults(items: Vec<String>, defaults: impl FnOnce() -> Vec<String>) -> Vec<String> {
    if items.is_empty() {
        defaults()
    } else {
        items
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_benefits() -> Vec<String> {
    strings(&[
        "Automated, standardized business processes",
        "Real-time visibility and reporting",
        "Scalable platform for future growth",
    ])
}

fn default_requirements() -> Vec<String> {
    strings(&[
        "Integration with existing systems",
        "Data migration and cleansing",
        "User training and change management",
    ])
}

fn default_risk_mitigation() -> Vec<String> {
    strings(&[
        "Phased rollout starting with a pilot group",
        "Executive sponsorship and steering committee",
        "Dedicated data quality workstream",
    ])
}

fn default_success_metrics() -> Vec<String> {
    strings(&[
        "Process cycle time reduction",
        "User adoption rate",
        "Realized savings against the business case",
    ])
}

fn default_success_factors() -> Vec<String> {
    strings(&[
        "Executive sponsorship throughout the program",
        "Clear ownership of business processes",
        "Early and continuous user involvement",
    ])
}

fn default_risk_factors() -> Vec<String> {
    strings(&[
        "Data quality issues delaying migration",
        "User resistance to new processes",
        "Integration complexity with legacy systems",
        "Scope creep during design",
    ])
}

fn default_next_steps() -> Vec<String> {
    strings(&[
        "Schedule a discovery workshop with process owners",
        "Validate the business case with finance",
        "Define pilot scope and timeline",
    ])
}
