pub const DEFAULT_REGION_HINT: &str = "Hyderabad, India";

pub const BIG_TECH_COMPANIES: &[&str] = &[
    "Google", "Microsoft", "Amazon", "Meta", "Apple", "Netflix", "NVIDIA",
    "Adobe", "Salesforce", "Uber", "Airbnb", "Stripe", "Dropbox", "Snowflake",
    "Oracle", "Cisco", "VMware", "PayPal", "Intel",
];

pub const INDIA_STARTUPS: &[&str] = &[
    "Flipkart", "Swiggy", "Zomato", "Ola", "Oyo", "Freshworks", "PhonePe",
    "Razorpay", "CRED", "Meesho", "Udaan", "BYJU'S", "Unacademy", "Zerodha",
    "Tata 1mg", "Spinny", "Zepto", "Dream11", "Groww", "InMobi",
];

pub const ROLE_KEYWORDS: &[&str] = &[
    "software engineer",
    "software developer",
    "SDE",
    "SDE 1",
    "backend engineer",
    "frontend engineer",
    "full stack developer",
    "data engineer",
    "ML engineer",
    "devops engineer",
    "site reliability engineer",
    "qa engineer",
    "test engineer",
];

pub const LEVEL_KEYWORDS: &[&str] = &[
    "fresher",
    "new grad",
    "new graduate",
    "graduate",
    "entry level",
    "0-1 years",
    "junior",
];

/// Static inputs for the query builder.
#[derive(Debug, Clone)]
pub struct QueryPlan<'a> {
    pub region_hint: &'a str,
    pub roles: &'a [&'a str],
    pub levels: &'a [&'a str],
    pub companies: Vec<&'a str>,
}

impl Default for QueryPlan<'static> {
    fn default() -> Self {
        Self {
            region_hint: DEFAULT_REGION_HINT,
            roles: ROLE_KEYWORDS,
            levels: LEVEL_KEYWORDS,
            companies: BIG_TECH_COMPANIES
                .iter()
                .chain(INDIA_STARTUPS.iter())
                .copied()
                .collect(),
        }
    }
}

impl QueryPlan<'_> {
    /// One "any company" query first, then one query per company in order.
    pub fn build(&self) -> Vec<String> {
        let roles = any_of(self.roles);
        let levels = any_of(self.levels);
        let region = self.region_hint;

        let mut queries = Vec::with_capacity(self.companies.len() + 1);
        queries.push(format!("({roles}) AND ({levels}) AND ({region})"));
        for company in &self.companies {
            queries.push(format!(
                "\"{company}\" AND ({roles}) AND ({levels}) AND ({region})"
            ));
        }
        queries
    }
}

fn any_of(keywords: &[&str]) -> String {
    keywords
        .iter()
        .map(|k| format!("\"{}\"", k))
        .collect::<Vec<_>>()
        .join(" OR ")
}
