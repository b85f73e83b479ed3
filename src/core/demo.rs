//! Fixed sample profiles for trying the directory out.

use crate::core::progression;
use crate::domain::model::{Proficiency, UserProfile};

struct Sample {
    id: &'static str,
    name: &'static str,
    email: &'static str,
    bio: &'static str,
    location: &'static str,
    interests: &'static [&'static str],
    offered: &'static [(&'static str, Option<Proficiency>)],
    wanted: &'static [&'static str],
    swaps: u32,
    rating: f64,
    xp: u64,
    endorsements: u32,
    response_rate: f64,
}

use Proficiency::{Expert, Intermediate};

const SAMPLES: &[Sample] = &[
    Sample {
        id: "demo-aman-verma",
        name: "Aman Verma",
        email: "aman@skillswap.com",
        bio: "Full-stack dev | Python & React enthusiast",
        location: "Mumbai",
        interests: &["web dev", "AI", "gaming"],
        offered: &[
            ("python", Some(Expert)),
            ("django", Some(Expert)),
            ("postgresql", Some(Intermediate)),
            ("docker", Some(Intermediate)),
        ],
        wanted: &["react", "typescript", "aws"],
        swaps: 8,
        rating: 4.9,
        xp: 250,
        endorsements: 14,
        response_rate: 98.0,
    },
    Sample {
        id: "demo-riya-kapoor",
        name: "Riya Kapoor",
        email: "riya@skillswap.com",
        bio: "Frontend wizard ✨ | React & Figma",
        location: "Bangalore",
        interests: &["design", "frontend", "UX"],
        offered: &[
            ("react", Some(Expert)),
            ("typescript", Some(Expert)),
            ("figma", Some(Intermediate)),
            ("css", None),
            ("tailwind", None),
        ],
        wanted: &["python", "django", "postgresql"],
        swaps: 6,
        rating: 4.7,
        xp: 180,
        endorsements: 11,
        response_rate: 95.0,
    },
    Sample {
        id: "demo-sameer-desai",
        name: "Sameer Desai",
        email: "sameer@skillswap.com",
        bio: "Data scientist 📊 | ML & Analytics",
        location: "Pune",
        interests: &["data science", "ML", "analytics"],
        offered: &[
            ("pandas", Some(Expert)),
            ("numpy", None),
            ("matplotlib", Some(Expert)),
            ("scikit-learn", Some(Intermediate)),
            ("sql", None),
        ],
        wanted: &["docker", "kubernetes", "aws", "react"],
        swaps: 12,
        rating: 5.0,
        xp: 380,
        endorsements: 18,
        response_rate: 100.0,
    },
    Sample {
        id: "demo-priya-sharma",
        name: "Priya Sharma",
        email: "priya@skillswap.com",
        bio: "DevOps Engineer | Cloud & Containers",
        location: "Delhi",
        interests: &["cloud", "devops", "automation"],
        offered: &[
            ("aws", Some(Expert)),
            ("docker", Some(Expert)),
            ("kubernetes", Some(Intermediate)),
            ("terraform", None),
        ],
        wanted: &["python", "golang", "rust"],
        swaps: 5,
        rating: 4.6,
        xp: 150,
        endorsements: 7,
        response_rate: 90.0,
    },
];

/// The four sample profiles, with badges matching their swap counts.
pub fn profiles() -> Vec<UserProfile> {
    SAMPLES.iter().map(Sample::to_profile).collect()
}

impl Sample {
    fn to_profile(&self) -> UserProfile {
        let mut user = UserProfile::new(self.name, self.email)
            .with_id(self.id)
            .with_bio(self.bio)
            .located_in(self.location)
            .with_interests(self.interests.iter().copied());
        for (skill, level) in self.offered {
            user = user.offering(skill, *level);
        }
        for skill in self.wanted {
            user = user.wanting(skill);
        }
        user.swaps_completed = self.swaps;
        user.rating = self.rating;
        user.experience_points = self.xp;
        user.endorsements_received = self.endorsements;
        user.response_rate = self.response_rate;
        progression::sync_level(&mut user);
        progression::award_badges(&mut user);
        user
    }
}
