//! Research brief sent with the web-search call.

use chrono::NaiveDate;

/// Brief asking for a procurement analysis of suppliers of `component` in `country`.
pub fn research_brief(component: &str, country: &str, today: NaiveDate) -> String {
    format!(
        r#"I am a senior category manager at a company that manufactures appliances. I need a thorough procurement analysis of suppliers of {component} in {country}.

Research the leading suppliers and cover, for each one:

CORE DETAILS
1. Company name
2. Website URL
3. Headquarters and manufacturing locations
4. Year founded
5. Company size (employees, revenue where available)

PRODUCT ASSESSMENT
6. Product offering relevant to {component}
7. Quality tier (premium, mid-range, budget)
8. Manufacturing capabilities and capacity
9. Technical specifications and differentiators
10. R&D and innovation focus

SUPPLY CHAIN FACTORS
11. Lead times, standard and expedited
12. Minimum order quantities
13. Production capacity
14. Geographic spread of facilities
15. Certifications (ISO, industry-specific, sustainability)

BUSINESS EVALUATION
16. Market reputation
17. Competitive advantages
18. Major clients or industries served
19. Financial stability indicators
20. Sustainability and ESG practices

PROCUREMENT INSIGHTS
21. Pricing model and price ranges where available
22. Flexibility of contract terms
23. Reliability
24. Known supply chain disruptions
25. Approach to vendor relationship management
26. Total cost of ownership considerations
27. Shipping and logistics capabilities
28. Import and export considerations specific to {country}
29. Procurement contact information where available
30. Negotiation leverage points

Then give each supplier a strategic assessment with a SWOT analysis, a risk score from 1 to 10 (10 is highest risk), strategic fit for appliance manufacturers, a comparison with industry benchmarks, and the potential for a long-term partnership.

Use structured JSON where it helps, but never drop an insight to fit a format.

Today's date is {today}.
Aim for at least 5 diverse suppliers, each with a complete analysis, combining objective facts with procurement judgement."#,
        today = today.format("%Y-%m-%d"),
    )
}
