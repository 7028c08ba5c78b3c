//! Template report used when AI generation is unavailable.
//!
//! [`build_fallback`] performs no I/O and reads no clock, so identical
//! input always yields identical markdown.

use crate::models::BusinessInfo;

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    let v = value.trim();
    if v.is_empty() {
        placeholder
    } else {
        v
    }
}

/// Build a fixed-structure markdown report from the request alone.
pub fn build_fallback(info: &BusinessInfo, final_prompt: &str) -> String {
    let name = or_placeholder(&info.business_name, "Your Business");
    let postal = or_placeholder(&info.postal_code, "Not provided");
    let country = or_placeholder(&info.country, "Not provided");
    let industry = or_placeholder(&info.industry, "Not provided");
    let prompt = or_placeholder(final_prompt, "No specific request provided");

    format!(
        r#"# Comprehensive Business Report for {name}

## Executive Summary
This report has been prepared from your business profile and your specific request.

## Company Profile
- **Business Name**: {name}
- **Postal Code**: {postal}
- **Country**: {country}
- **Industry Sector**: {industry}

## Request Analysis
**Your Request**: "{prompt}"

## Market Analysis
Based on your location in {country} and your operation in the {industry} sector:

### Industry Overview
- The {industry} sector shows various opportunities and challenges
- Location-specific factors in {country} may impact operations
- Market conditions should be monitored regularly

### Regional Considerations
- Operating in the {postal} area
- Local market dynamics in {country}
- Regulatory environment considerations

## Strategic Recommendations

### Short-term Actions
1. Assess current market position in the {industry} sector
2. Evaluate local competition in {country}
3. Review operational efficiency measures

### Long-term Strategy
1. Consider expansion opportunities within {industry}
2. Develop market presence in {country}
3. Build sustainable competitive advantages

## Risk Assessment
- Industry-specific risks in {industry}
- Regional risks in {country}
- Operational risk factors

## Next Steps
1. Review recommendations with your team
2. Prioritize implementation actions
3. Establish monitoring and review processes

---
*This is a template report generated without AI analysis.*"#
    )
}
