//! Cloud concept catalog and quiz bank.
//!
//! All content is static and shared by reference. Nothing mutates it;
//! learned state lives on the player and in the progress tracker.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Share of correct answers needed to pass, in percent.
pub const PASS_PERCENTAGE: f32 = 70.0;

/// Concept categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptCategory {
    /// Virtual servers and functions
    Compute,
    /// Object and block storage
    Storage,
    /// Virtual networks
    Networking,
    /// Identity and access
    Security,
    /// Delivery pipelines
    DevOps,
}

impl ConceptCategory {
    /// Lowercase name used in stats.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::Storage => "storage",
            Self::Networking => "networking",
            Self::Security => "security",
            Self::DevOps => "devops",
        }
    }
}

/// A unit of educational content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudConcept {
    /// Stable id
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Category
    pub category: ConceptCategory,
    /// One-line summary
    pub description: &'static str,
    /// Lesson text shown on the content pages
    pub content: &'static str,
    /// Concepts that must be learned first
    pub prerequisites: &'static [&'static str],
    /// Ability name granted on mastery
    pub unlock_ability: Option<&'static str>,
    /// Difficulty from 1 to 5
    pub difficulty: u8,
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    /// Concept this question tests
    pub concept_id: &'static str,
    /// Question text
    pub question: &'static str,
    /// Answer options
    pub options: &'static [&'static str],
    /// Index of the correct option
    pub correct: usize,
    /// Shown after answering
    pub explanation: &'static str,
}

/// Concepts in the catalog.
pub const CONCEPT_COUNT: usize = 5;

static CONCEPTS: [CloudConcept; CONCEPT_COUNT] = [
    CloudConcept {
        id: "ec2_basics",
        name: "EC2 Basics",
        category: ConceptCategory::Compute,
        description: "Learn about Amazon EC2 virtual servers",
        content: "Amazon Elastic Compute Cloud (EC2) provides scalable virtual servers in the cloud.\n\
\n\
Key Features:\n\
- Virtual machines called instances\n\
- Multiple instance types for different workloads\n\
- Pay-as-you-go pricing model\n\
- Global availability across regions\n\
- Auto Scaling capabilities\n\
\n\
Instance Types:\n\
- General Purpose (t3, m5): Balanced CPU, memory, networking\n\
- Compute Optimized (c5): High-performance processors\n\
- Memory Optimized (r5): Fast performance for memory-intensive workloads\n\
- Storage Optimized (i3): High sequential read/write access\n\
\n\
Best Practices:\n\
- Choose the right instance type for your workload\n\
- Use Auto Scaling for variable demand\n\
- Implement proper security groups\n\
- Regular backups with snapshots\n",
        prerequisites: &[],
        unlock_ability: Some("auto_scaling"),
        difficulty: 1,
    },
    CloudConcept {
        id: "lambda_serverless",
        name: "AWS Lambda & Serverless",
        category: ConceptCategory::Compute,
        description: "Serverless computing with AWS Lambda",
        content: "AWS Lambda lets you run code without provisioning servers.\n\
\n\
Key Benefits:\n\
- No server management required\n\
- Automatic scaling\n\
- Pay only for compute time used\n\
- Built-in fault tolerance\n\
- Integrates with many AWS services\n\
\n\
Use Cases:\n\
- Event-driven processing\n\
- Real-time file processing\n\
- Web application backends\n\
- IoT data processing\n\
- Scheduled tasks\n\
\n\
Best Practices:\n\
- Keep functions small and focused\n\
- Optimize cold start times\n\
- Use environment variables for configuration\n\
- Implement proper error handling\n\
- Monitor with CloudWatch\n",
        prerequisites: &["ec2_basics"],
        unlock_ability: Some("serverless_deploy"),
        difficulty: 2,
    },
    CloudConcept {
        id: "s3_storage",
        name: "Amazon S3 Storage",
        category: ConceptCategory::Storage,
        description: "Object storage with Amazon S3",
        content: "Amazon Simple Storage Service (S3) provides object storage in the cloud.\n\
\n\
Key Features:\n\
- Virtually unlimited storage capacity\n\
- 99.999999999% (11 9's) durability\n\
- Multiple storage classes for cost optimization\n\
- Global accessibility via web interface\n\
- Versioning and lifecycle management\n\
\n\
Storage Classes:\n\
- Standard: Frequently accessed data\n\
- Intelligent-Tiering: Automatic cost optimization\n\
- Glacier: Long-term archival\n\
- Deep Archive: Lowest cost archival\n\
\n\
Security Features:\n\
- Encryption at rest and in transit\n\
- Access control with IAM policies\n\
- Bucket policies and ACLs\n\
- VPC endpoints for private access\n",
        prerequisites: &[],
        unlock_ability: Some("data_backup"),
        difficulty: 1,
    },
    CloudConcept {
        id: "vpc_networking",
        name: "VPC Networking",
        category: ConceptCategory::Networking,
        description: "Virtual Private Cloud networking",
        content: "Amazon Virtual Private Cloud (VPC) provides isolated network environments.\n\
\n\
Core Components:\n\
- Subnets: Divide VPC into smaller networks\n\
- Route Tables: Control traffic routing\n\
- Internet Gateway: Connect to internet\n\
- NAT Gateway: Outbound internet for private subnets\n\
- Security Groups: Instance-level firewalls\n\
\n\
Network Design:\n\
- Public subnets for web servers\n\
- Private subnets for databases\n\
- Multiple Availability Zones for high availability\n\
- CIDR block planning for IP addressing\n\
\n\
Best Practices:\n\
- Use multiple AZs for redundancy\n\
- Implement defense in depth\n\
- Monitor network traffic\n\
- Use VPC Flow Logs for troubleshooting\n",
        prerequisites: &[],
        unlock_ability: Some("network_isolation"),
        difficulty: 2,
    },
    CloudConcept {
        id: "iam_security",
        name: "IAM Security",
        category: ConceptCategory::Security,
        description: "Identity and Access Management",
        content: "AWS Identity and Access Management (IAM) controls access to AWS resources.\n\
\n\
Key Components:\n\
- Users: Individual identities\n\
- Groups: Collections of users\n\
- Roles: Temporary access for services\n\
- Policies: Define permissions\n\
\n\
Security Principles:\n\
- Principle of least privilege\n\
- Use roles instead of users for applications\n\
- Enable MFA for sensitive operations\n\
- Regular access reviews and rotation\n\
\n\
Best Practices:\n\
- Never share access keys\n\
- Use temporary credentials when possible\n\
- Implement strong password policies\n\
- Monitor access with CloudTrail\n\
- Use policy conditions for fine-grained control\n",
        prerequisites: &[],
        unlock_ability: Some("access_control"),
        difficulty: 2,
    },
];

static QUESTIONS: [QuizQuestion; 11] = [
    QuizQuestion {
        concept_id: "ec2_basics",
        question: "What does EC2 stand for?",
        options: &[
            "Elastic Compute Cloud",
            "Enhanced Cloud Computing",
            "Enterprise Cloud Container",
            "Elastic Container Cloud",
        ],
        correct: 0,
        explanation: "EC2 stands for Elastic Compute Cloud, providing scalable virtual servers.",
    },
    QuizQuestion {
        concept_id: "ec2_basics",
        question: "Which EC2 instance type is best for memory-intensive applications?",
        options: &[
            "t3 (General Purpose)",
            "c5 (Compute Optimized)",
            "r5 (Memory Optimized)",
            "i3 (Storage Optimized)",
        ],
        correct: 2,
        explanation: "R5 instances are memory optimized, designed for memory-intensive workloads.",
    },
    QuizQuestion {
        concept_id: "ec2_basics",
        question: "What is the main benefit of EC2 Auto Scaling?",
        options: &[
            "Reduces costs by shutting down unused instances",
            "Automatically adjusts capacity based on demand",
            "Provides better security for instances",
            "Increases network performance",
        ],
        correct: 1,
        explanation: "Auto Scaling adjusts the number of instances to match demand.",
    },
    QuizQuestion {
        concept_id: "lambda_serverless",
        question: "What is the main advantage of serverless computing?",
        options: &[
            "Better performance than traditional servers",
            "No server management required",
            "Lower latency for all applications",
            "Unlimited execution time",
        ],
        correct: 1,
        explanation: "Serverless removes server management so you can focus on code.",
    },
    QuizQuestion {
        concept_id: "lambda_serverless",
        question: "How does AWS Lambda pricing work?",
        options: &[
            "Fixed monthly fee per function",
            "Pay per server hour used",
            "Pay only for compute time consumed",
            "Free for all usage",
        ],
        correct: 2,
        explanation: "Lambda bills only for the compute time your code consumes.",
    },
    QuizQuestion {
        concept_id: "s3_storage",
        question: "What is Amazon S3's durability rating?",
        options: &[
            "99.9% (three 9's)",
            "99.99% (four 9's)",
            "99.999999999% (eleven 9's)",
            "100% guaranteed",
        ],
        correct: 2,
        explanation: "S3 is designed for eleven 9's of durability.",
    },
    QuizQuestion {
        concept_id: "s3_storage",
        question: "Which S3 storage class is most cost-effective for long-term archival?",
        options: &[
            "S3 Standard",
            "S3 Intelligent-Tiering",
            "S3 Glacier",
            "S3 Glacier Deep Archive",
        ],
        correct: 3,
        explanation: "Glacier Deep Archive has the lowest cost, with retrievals taking 12+ hours.",
    },
    QuizQuestion {
        concept_id: "vpc_networking",
        question: "What is the purpose of a NAT Gateway in a VPC?",
        options: &[
            "Provide internet access to public subnets",
            "Allow private subnets to access the internet",
            "Connect multiple VPCs together",
            "Provide DNS resolution",
        ],
        correct: 1,
        explanation: "A NAT Gateway gives private subnets outbound internet access.",
    },
    QuizQuestion {
        concept_id: "vpc_networking",
        question: "What is the recommended practice for high availability in VPC design?",
        options: &[
            "Use only one large subnet",
            "Deploy across multiple Availability Zones",
            "Use only private subnets",
            "Avoid using security groups",
        ],
        correct: 1,
        explanation: "Spreading across Availability Zones provides redundancy.",
    },
    QuizQuestion {
        concept_id: "iam_security",
        question: "What is the principle of least privilege in IAM?",
        options: &[
            "Give users maximum permissions for convenience",
            "Grant only the minimum permissions needed",
            "Use only root account access",
            "Avoid using policies altogether",
        ],
        correct: 1,
        explanation: "Grant only the permissions required to perform a task.",
    },
    QuizQuestion {
        concept_id: "iam_security",
        question: "When should you use IAM roles instead of users?",
        options: &[
            "For human administrators only",
            "For applications and AWS services",
            "Never, users are always better",
            "Only for temporary access",
        ],
        correct: 1,
        explanation: "Roles give applications and services temporary, rotating credentials.",
    },
];

/// Every concept in the catalog.
#[must_use]
pub fn concepts() -> &'static [CloudConcept] {
    &CONCEPTS
}

/// Looks up a concept by id.
#[must_use]
pub fn concept(id: &str) -> Option<&'static CloudConcept> {
    let found = CONCEPTS.iter().find(|c| c.id == id);
    if found.is_none() {
        debug!("Unknown concept id: {id}");
    }
    found
}

/// Quiz questions for a concept, in catalog order.
#[must_use]
pub fn questions_for(concept_id: &str) -> Vec<&'static QuizQuestion> {
    QUESTIONS
        .iter()
        .filter(|q| q.concept_id == concept_id)
        .collect()
}

/// Whether every prerequisite of `concept` is in `learned`.
#[must_use]
pub fn prerequisites_met(concept: &CloudConcept, learned: &[String]) -> bool {
    concept
        .prerequisites
        .iter()
        .all(|p| learned.iter().any(|l| l == p))
}

/// Concepts not yet learned whose prerequisites are all met.
#[must_use]
pub fn available_concepts(learned: &[String]) -> Vec<&'static CloudConcept> {
    CONCEPTS
        .iter()
        .filter(|c| !learned.iter().any(|l| l == c.id))
        .filter(|c| prerequisites_met(c, learned))
        .collect()
}

// ============================================================================
// Learning Module
// ============================================================================

/// Sequential quiz over one concept with a wrong-answer budget.
#[derive(Debug, Clone)]
pub struct LearningModule {
    concept: &'static CloudConcept,
    questions: Vec<&'static QuizQuestion>,
    current: usize,
    score: usize,
    wrong_attempts: u32,
    max_attempts: u32,
    completed: bool,
}

impl LearningModule {
    /// Creates a module for `concept_id`, or `None` if it is unknown.
    #[must_use]
    pub fn new(concept_id: &str) -> Option<Self> {
        let concept = concept(concept_id)?;
        Some(Self {
            concept,
            questions: questions_for(concept_id),
            current: 0,
            score: 0,
            wrong_attempts: 0,
            max_attempts: 3,
            completed: false,
        })
    }

    /// Concept under study.
    #[must_use]
    pub fn concept(&self) -> &'static CloudConcept {
        self.concept
    }

    /// Question waiting for an answer.
    #[must_use]
    pub fn current_question(&self) -> Option<&'static QuizQuestion> {
        if self.completed {
            return None;
        }
        self.questions.get(self.current).copied()
    }

    /// Answers the current question. A correct answer moves on; a wrong one
    /// spends an attempt. Returns whether it was correct and the explanation,
    /// or `None` when no question is pending.
    pub fn answer(&mut self, option: usize) -> Option<(bool, &'static str)> {
        let question = self.current_question()?;
        let correct = option == question.correct;
        if correct {
            self.score += 1;
            self.current += 1;
        } else {
            self.wrong_attempts += 1;
        }

        if self.current >= self.questions.len() || self.wrong_attempts >= self.max_attempts {
            self.completed = true;
        }
        Some((correct, question.explanation))
    }

    /// (answered correctly so far, total questions).
    #[must_use]
    pub fn progress(&self) -> (usize, usize) {
        (self.current, self.questions.len())
    }

    /// Score in percent.
    #[must_use]
    pub fn score_percentage(&self) -> f32 {
        if self.questions.is_empty() {
            return 0.0;
        }
        self.score as f32 / self.questions.len() as f32 * 100.0
    }

    /// Whether the module is finished.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Finished with a passing score.
    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.completed && self.score_percentage() >= PASS_PERCENTAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<_> = concepts().iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_every_question_is_answerable() {
        for q in &QUESTIONS {
            assert!(q.correct < q.options.len(), "{}", q.question);
            assert!(concept(q.concept_id).is_some());
        }
        for c in concepts() {
            assert!(!questions_for(c.id).is_empty(), "{} has no questions", c.id);
        }
    }

    #[test]
    fn test_prerequisites_reference_catalog() {
        for c in concepts() {
            for p in c.prerequisites {
                assert!(concept(p).is_some());
            }
        }
    }

    #[test]
    fn test_lookup() {
        let ec2 = concept("ec2_basics").expect("ec2");
        assert_eq!(ec2.name, "EC2 Basics");
        assert_eq!(ec2.category, ConceptCategory::Compute);
        assert!(concept("quantum").is_none());
        assert_eq!(questions_for("ec2_basics").len(), 3);
        assert!(questions_for("quantum").is_empty());
    }

    #[test]
    fn test_available_concepts_respects_prerequisites() {
        let none: Vec<String> = Vec::new();
        let ids: Vec<_> = available_concepts(&none).iter().map(|c| c.id).collect();
        assert!(!ids.contains(&"lambda_serverless"));
        assert!(ids.contains(&"ec2_basics"));

        let learned = vec!["ec2_basics".to_string()];
        let ids: Vec<_> = available_concepts(&learned).iter().map(|c| c.id).collect();
        assert!(ids.contains(&"lambda_serverless"));
        assert!(!ids.contains(&"ec2_basics"));
    }

    #[test]
    fn test_module_perfect_run() {
        let mut module = LearningModule::new("ec2_basics").expect("module");
        assert_eq!(module.answer(0), Some((true, QUESTIONS[0].explanation)));
        assert_eq!(module.answer(2).map(|r| r.0), Some(true));
        assert_eq!(module.answer(1).map(|r| r.0), Some(true));
        assert!(module.is_completed());
        assert!(module.is_passed());
        assert!((module.score_percentage() - 100.0).abs() < 0.001);
        assert!(module.answer(0).is_none());
    }

    #[test]
    fn test_module_attempt_budget() {
        let mut module = LearningModule::new("s3_storage").expect("module");
        assert_eq!(module.answer(0).map(|r| r.0), Some(false));
        assert_eq!(module.answer(1).map(|r| r.0), Some(false));
        assert!(!module.is_completed());
        assert_eq!(module.answer(3).map(|r| r.0), Some(false));
        assert!(module.is_completed());
        assert!(!module.is_passed());
        assert_eq!(module.progress(), (0, 2));
    }

    #[test]
    fn test_unknown_module() {
        assert!(LearningModule::new("nope").is_none());
    }
}
