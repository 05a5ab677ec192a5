//! Built-in reference knowledge: category tables used to enrich catalog
//! rows, seed industry contexts, best practices, and per-industry default
//! challenges used when a company did not describe its own.

use super::catalog::{BestPractice, IndustryContext};

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub(crate) fn features_for(category: &str) -> Vec<String> {
    owned(match category {
        "ERP" => &[
            "Real-time financial reporting and analytics",
            "Integrated business processes across modules",
            "Advanced planning and optimization",
            "Cloud-native architecture with scalability",
        ],
        "CRM" => &[
            "360-degree customer view and insights",
            "Advanced lead and opportunity management",
            "Marketing automation and campaign management",
            "Sales forecasting and pipeline analytics",
        ],
        "Analytics" => &[
            "Real-time business intelligence dashboards",
            "Advanced predictive analytics and AI",
            "Self-service reporting and data visualization",
            "Integration with multiple data sources",
        ],
        "Procurement" => &[
            "End-to-end procurement process automation",
            "Supplier relationship management",
            "Spend analysis and optimization",
            "Contract lifecycle management",
        ],
        "HR" => &[
            "Comprehensive talent management suite",
            "Performance and goal management",
            "Learning and development tracking",
            "Advanced workforce analytics",
        ],
        "E-commerce" => &[
            "Omnichannel commerce capabilities",
            "Personalized customer experiences",
            "Advanced inventory management",
            "Seamless payment and checkout processes",
        ],
        "Expense Management" => &[
            "Automated expense processing and approval",
            "Travel booking and management",
            "Policy compliance and enforcement",
            "Real-time expense analytics and reporting",
        ],
        "Workforce" => &[
            "External workforce management",
            "Vendor management and compliance",
            "Project-based resource allocation",
            "Advanced analytics and reporting",
        ],
        _ => &[
            "Advanced business process automation",
            "Real-time analytics and reporting",
            "Cloud-native scalability and performance",
            "Comprehensive integration capabilities",
        ],
    })
}

pub(crate) fn benefits_for(category: &str) -> Vec<String> {
    owned(match category {
        "ERP" => &[
            "Streamlined business operations and reduced costs",
            "Improved decision-making with real-time insights",
            "Enhanced compliance and risk management",
            "Scalable growth and digital transformation",
        ],
        "CRM" => &[
            "Increased customer satisfaction and retention",
            "Improved sales productivity and revenue growth",
            "Better marketing ROI and campaign effectiveness",
            "Enhanced customer insights and personalization",
        ],
        "Analytics" => &[
            "Data-driven decision making and strategic insights",
            "Improved operational efficiency and performance",
            "Enhanced competitive intelligence and market analysis",
            "Real-time visibility into business metrics",
        ],
        "Procurement" => &[
            "Reduced procurement costs and improved efficiency",
            "Enhanced supplier relationships and compliance",
            "Better spend visibility and control",
            "Streamlined procurement processes and workflows",
        ],
        "HR" => &[
            "Improved talent acquisition and retention",
            "Enhanced employee engagement and productivity",
            "Better workforce planning and optimization",
            "Streamlined HR processes and compliance",
        ],
        "E-commerce" => &[
            "Increased online sales and customer engagement",
            "Improved customer experience and satisfaction",
            "Enhanced inventory management and fulfillment",
            "Seamless omnichannel commerce capabilities",
        ],
        "Expense Management" => &[
            "Reduced expense processing costs and time",
            "Improved policy compliance and control",
            "Enhanced travel management and booking",
            "Better expense visibility and analytics",
        ],
        "Workforce" => &[
            "Improved external workforce management",
            "Enhanced vendor compliance and risk management",
            "Better resource allocation and project delivery",
            "Streamlined workforce processes and analytics",
        ],
        _ => &[
            "Improved operational efficiency and productivity",
            "Enhanced decision-making with data insights",
            "Reduced costs and increased ROI",
            "Better compliance and risk management",
        ],
    })
}

pub(crate) fn use_cases_for(category: &str) -> Vec<String> {
    owned(match category {
        "ERP" => &[
            "Enterprise resource planning and management",
            "Financial accounting and reporting",
            "Supply chain and inventory management",
            "Manufacturing and production planning",
        ],
        "CRM" => &[
            "Customer relationship management and sales",
            "Marketing automation and campaign management",
            "Customer service and support",
            "Lead and opportunity management",
        ],
        "Analytics" => &[
            "Business intelligence and reporting",
            "Predictive analytics and forecasting",
            "Performance monitoring and dashboards",
            "Data visualization and insights",
        ],
        "Procurement" => &[
            "Procurement and sourcing management",
            "Supplier relationship management",
            "Contract and spend management",
            "Procurement analytics and optimization",
        ],
        "HR" => &[
            "Human capital management and HR processes",
            "Talent acquisition and recruitment",
            "Performance and goal management",
            "Learning and development",
        ],
        "E-commerce" => &[
            "Online retail and digital commerce",
            "B2B and B2C commerce platforms",
            "Omnichannel retail operations",
            "E-commerce analytics and optimization",
        ],
        "Expense Management" => &[
            "Travel and expense management",
            "Corporate card and expense processing",
            "Policy compliance and approval workflows",
            "Expense analytics and reporting",
        ],
        "Workforce" => &[
            "External workforce and vendor management",
            "Project-based resource allocation",
            "Contingent workforce management",
            "Workforce analytics and optimization",
        ],
        _ => &[
            "Business process automation and optimization",
            "Data-driven decision making and analytics",
            "Digital transformation and modernization",
            "Operational efficiency and cost reduction",
        ],
    })
}

/// Challenges assumed for an industry when the company gave none.
pub fn default_challenges(industry: &str) -> Vec<String> {
    owned(match industry {
        "Financial Services" => &[
            "Regulatory compliance and reporting",
            "Risk management and fraud detection",
            "Legacy system integration",
        ],
        "Manufacturing" => &[
            "Supply chain complexity",
            "Quality control and compliance",
            "Production planning and scheduling",
        ],
        "Healthcare" => &[
            "Patient data security and HIPAA compliance",
            "Interoperability between systems",
            "Revenue cycle management",
        ],
        "Technology" => &[
            "Scalability and performance",
            "Data integration and analytics",
            "Customer experience optimization",
        ],
        "Retail" => &["Inventory management", "Customer experience", "Omnichannel operations"],
        _ => &["Operational efficiency", "Data integration", "Process optimization"],
    })
}

pub fn industry_contexts() -> Vec<IndustryContext> {
    vec![
        IndustryContext {
            industry: "Financial Services".to_string(),
            challenges: owned(&[
                "Regulatory compliance and reporting requirements",
                "Risk management and fraud detection",
                "Customer data security and privacy",
                "Legacy system integration",
                "Real-time transaction processing",
            ]),
            trends: owned(&[
                "Digital transformation and fintech disruption",
                "AI and machine learning adoption",
                "Cloud migration and hybrid architectures",
                "Open banking and API integration",
                "Sustainability and ESG reporting",
            ]),
            solutions: owned(&[
                "SAP for Banking",
                "SAP S/4HANA Finance",
                "SAP Analytics Cloud",
                "SAP Customer Experience",
            ]),
            success_stories: owned(&[
                "Major banks achieving 40% reduction in compliance costs",
                "Insurance companies improving claims processing by 60%",
                "Investment firms reducing risk assessment time by 70%",
            ]),
            best_practices: owned(&[
                "Start with core financial modules",
                "Implement robust security and compliance frameworks",
                "Focus on data quality and governance",
                "Plan for regulatory changes and updates",
            ]),
        },
        IndustryContext {
            industry: "Manufacturing".to_string(),
            challenges: owned(&[
                "Supply chain complexity and disruption",
                "Quality control and compliance",
                "Inventory optimization",
                "Production planning and scheduling",
                "Equipment maintenance and downtime",
            ]),
            trends: owned(&[
                "Industry 4.0 and smart manufacturing",
                "IoT and predictive maintenance",
                "Sustainability and circular economy",
                "Supply chain resilience",
                "Digital twin technology",
            ]),
            solutions: owned(&[
                "SAP S/4HANA Manufacturing",
                "SAP Ariba",
                "SAP Digital Supply Chain",
                "SAP Analytics Cloud",
            ]),
            success_stories: owned(&[
                "Manufacturers reducing production costs by 25%",
                "Companies improving supply chain visibility by 80%",
                "Organizations reducing inventory carrying costs by 30%",
            ]),
            best_practices: owned(&[
                "Implement end-to-end supply chain visibility",
                "Focus on predictive maintenance and IoT integration",
                "Standardize processes across global operations",
                "Invest in employee training and change management",
            ]),
        },
        IndustryContext {
            industry: "Healthcare".to_string(),
            challenges: owned(&[
                "Patient data security and HIPAA compliance",
                "Interoperability between systems",
                "Revenue cycle management",
                "Clinical workflow optimization",
                "Resource allocation and staffing",
            ]),
            trends: owned(&[
                "Telehealth and remote care",
                "AI-powered diagnostics and treatment",
                "Value-based care models",
                "Patient engagement and experience",
                "Population health management",
            ]),
            solutions: owned(&[
                "SAP for Healthcare",
                "SAP S/4HANA",
                "SAP Analytics Cloud",
                "SAP Customer Experience",
            ]),
            success_stories: owned(&[
                "Hospitals improving patient outcomes by 35%",
                "Healthcare systems reducing administrative costs by 40%",
                "Organizations improving revenue cycle efficiency by 50%",
            ]),
            best_practices: owned(&[
                "Prioritize patient data security and compliance",
                "Focus on interoperability and system integration",
                "Implement evidence-based clinical workflows",
                "Invest in patient engagement and experience",
            ]),
        },
    ]
}

pub fn best_practices() -> Vec<BestPractice> {
    vec![
        BestPractice {
            category: "implementation".to_string(),
            title: "Implementation Best Practices".to_string(),
            content: "Successful implementations require careful planning, executive sponsorship, \
                      change management, and phased rollouts. Key success factors include clear \
                      business objectives, stakeholder alignment, data quality preparation, and \
                      comprehensive training programs."
                .to_string(),
        },
        BestPractice {
            category: "roi".to_string(),
            title: "ROI Optimization Strategies".to_string(),
            content: "To maximize ROI, focus on process optimization, user adoption, data quality, \
                      and continuous improvement. Measure success through key performance \
                      indicators, user satisfaction, and business process efficiency gains."
                .to_string(),
        },
        BestPractice {
            category: "change_management".to_string(),
            title: "Change Management".to_string(),
            content: "Effective change management is critical for success. This includes \
                      communication plans, training programs, user support, and addressing \
                      resistance to change. Success depends on leadership commitment and \
                      employee engagement."
                .to_string(),
        },
    ]
}
