//! Development fixtures. Every insert is `OR IGNORE` on a fixed id, so
//! loading twice changes nothing and never overwrites edited rows.

use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::db::format_time;
use crate::error::AppResult;

struct ForumSeed {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: &'static str,
}

struct GroupSeed {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    theme: &'static str,
}

struct ResourceSeed {
    id: &'static str,
    title: &'static str,
    content: &'static str,
    resource_type: &'static str,
    category: &'static str,
    author: &'static str,
    tags: &'static [&'static str],
    is_premium: bool,
}

struct PostSeed {
    id: &'static str,
    author_id: &'static str,
    author_name: &'static str,
    title: &'static str,
    content: &'static str,
    category: &'static str,
    tags: &'static [&'static str],
    likes_count: i64,
    comments_count: i64,
}

/// Rows newly written by one `load` call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub forums: usize,
    pub groups: usize,
    pub resources: usize,
    pub users: usize,
    pub posts: usize,
}

pub fn load(conn: &mut Connection) -> AppResult<SeedReport> {
    let now = format_time(&Utc::now());
    let mut report = SeedReport::default();
    let tx = conn.transaction()?;

    for forum in FORUMS {
        report.forums += tx.execute(
            "INSERT OR IGNORE INTO forums (id, name, description, category, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![forum.id, forum.name, forum.description, forum.category, now],
        )?;
    }

    for group in GROUPS {
        report.groups += tx.execute(
            "INSERT OR IGNORE INTO support_groups (id, name, description, theme, is_private, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![group.id, group.name, group.description, group.theme, now],
        )?;
    }

    for resource in RESOURCES {
        report.resources += tx.execute(
            "INSERT OR IGNORE INTO resources (id, title, content, resource_type, category, author, \
             tags, is_premium, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                resource.id,
                resource.title,
                resource.content,
                resource.resource_type,
                resource.category,
                resource.author,
                serde_json::to_string(resource.tags)?,
                resource.is_premium,
                now
            ],
        )?;
    }

    for post in POSTS {
        // Sample authors are real rows so that foreign keys hold. They have no
        // password and cannot log in.
        report.users += tx.execute(
            "INSERT OR IGNORE INTO users (id, email, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                post.author_id,
                format!("{}@sample.invalid", post.author_id),
                post.author_name,
                now
            ],
        )?;
        report.posts += tx.execute(
            "INSERT OR IGNORE INTO posts (id, author_id, author_name, title, content, images, \
             category, tags, likes_count, comments_count, is_moderated, moderation_status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, '[]', ?6, ?7, ?8, ?9, 1, 'approved', ?10)",
            params![
                post.id,
                post.author_id,
                post.author_name,
                post.title,
                post.content,
                post.category,
                serde_json::to_string(post.tags)?,
                post.likes_count,
                post.comments_count,
                now
            ],
        )?;
    }

    tx.commit()?;
    tracing::info!(
        "Seeded {} forums, {} groups, {} resources, {} posts",
        report.forums,
        report.groups,
        report.resources,
        report.posts
    );
    Ok(report)
}

const FORUMS: &[ForumSeed] = &[
    ForumSeed {
        id: "forum_pregnancy",
        name: "Pregnancy Journey",
        description: "Share your pregnancy experiences",
        category: "pregnancy",
    },
    ForumSeed {
        id: "forum_childbirth",
        name: "Childbirth Stories",
        description: "Birth stories and experiences",
        category: "childbirth",
    },
    ForumSeed {
        id: "forum_postpartum",
        name: "Postpartum Recovery",
        description: "Postpartum journey and recovery",
        category: "postpartum",
    },
    ForumSeed {
        id: "forum_milestones",
        name: "Baby Milestones",
        description: "Track and celebrate baby milestones",
        category: "baby_milestones",
    },
    ForumSeed {
        id: "forum_nutrition",
        name: "Pregnancy Nutrition",
        description: "Healthy eating during pregnancy",
        category: "pregnancy",
    },
    ForumSeed {
        id: "forum_exercise",
        name: "Prenatal Fitness",
        description: "Safe exercises during pregnancy",
        category: "pregnancy",
    },
    ForumSeed {
        id: "forum_twins",
        name: "Multiples Support",
        description: "For moms expecting twins or multiples",
        category: "pregnancy",
    },
    ForumSeed {
        id: "forum_adoption",
        name: "Adoption Journey",
        description: "Support for adoptive parents",
        category: "general",
    },
    ForumSeed {
        id: "forum_babynames",
        name: "Baby Names",
        description: "Discuss and share baby name ideas",
        category: "pregnancy",
    },
    ForumSeed {
        id: "forum_nursery",
        name: "Nursery & Baby Gear",
        description: "Tips on setting up your nursery",
        category: "pregnancy",
    },
    ForumSeed {
        id: "forum_workingmoms",
        name: "Working Moms",
        description: "Balancing career and motherhood",
        category: "general",
    },
    ForumSeed {
        id: "forum_singlemoms",
        name: "Single Moms Community",
        description: "Support for single mothers",
        category: "general",
    },
];

const GROUPS: &[GroupSeed] = &[
    GroupSeed {
        id: "group_ppd",
        name: "Postpartum Depression Support",
        description: "Support for mothers dealing with postpartum depression",
        theme: "postpartum_depression",
    },
    GroupSeed {
        id: "group_breastfeeding",
        name: "Breastfeeding Support",
        description: "Tips and support for breastfeeding mothers",
        theme: "breastfeeding",
    },
    GroupSeed {
        id: "group_sleep",
        name: "Sleep Training Circle",
        description: "Help with baby sleep training",
        theme: "sleep_training",
    },
    GroupSeed {
        id: "group_firsttime",
        name: "First Time Moms",
        description: "Support group for first-time mothers",
        theme: "first_time_moms",
    },
    GroupSeed {
        id: "group_csection",
        name: "C-Section Recovery",
        description: "Support for c-section recovery",
        theme: "c_section",
    },
    GroupSeed {
        id: "group_premature",
        name: "Preemie Parents",
        description: "Support for parents of premature babies",
        theme: "premature",
    },
    GroupSeed {
        id: "group_loss",
        name: "Pregnancy & Infant Loss",
        description: "Compassionate support for loss",
        theme: "loss",
    },
    GroupSeed {
        id: "group_ivf",
        name: "IVF & Fertility Journey",
        description: "Support during fertility treatments",
        theme: "fertility",
    },
];

const RESOURCES: &[ResourceSeed] = &[
    ResourceSeed {
        id: "res_001",
        title: "Understanding Early Pregnancy Symptoms",
        content: "Learn about morning sickness, fatigue, and other early signs of pregnancy. Discover tips for managing these symptoms naturally.",
        resource_type: "article",
        category: "pregnancy",
        author: "Dr. Sarah Johnson",
        tags: &["pregnancy", "symptoms"],
        is_premium: false,
    },
    ResourceSeed {
        id: "res_002",
        title: "Preparing for Labor and Delivery",
        content: "A comprehensive guide covering breathing techniques, pain management options, and what to expect during labor.",
        resource_type: "guide",
        category: "childbirth",
        author: "Dr. Emily Chen",
        tags: &["childbirth", "labor"],
        is_premium: false,
    },
    ResourceSeed {
        id: "res_003",
        title: "Postpartum Recovery Tips",
        content: "Essential guidance for physical and emotional recovery after giving birth, including care for c-sections and natural births.",
        resource_type: "article",
        category: "postpartum",
        author: "Dr. Maria Rodriguez",
        tags: &["postpartum", "recovery"],
        is_premium: false,
    },
    ResourceSeed {
        id: "res_004",
        title: "Baby's First Year Milestones",
        content: "Track developmental milestones from birth to age one, including motor skills, cognitive development, and social interactions.",
        resource_type: "guide",
        category: "baby_milestones",
        author: "Dr. James Lee",
        tags: &["milestones", "development"],
        is_premium: false,
    },
    ResourceSeed {
        id: "res_005",
        title: "Advanced Nutrition During Pregnancy",
        content: "Premium guide to optimal nutrition for pregnancy, including meal plans and supplement recommendations.",
        resource_type: "guide",
        category: "pregnancy",
        author: "Dr. Sarah Johnson",
        tags: &["pregnancy", "nutrition"],
        is_premium: true,
    },
    ResourceSeed {
        id: "res_006",
        title: "Safe Exercise During Pregnancy",
        content: "Learn which exercises are safe during each trimester and how to stay active throughout pregnancy.",
        resource_type: "article",
        category: "pregnancy",
        author: "Dr. Lisa Martinez",
        tags: &["pregnancy", "exercise"],
        is_premium: false,
    },
    ResourceSeed {
        id: "res_007",
        title: "Breastfeeding Basics",
        content: "A beginner's guide to breastfeeding, covering latch techniques, feeding schedules, and common challenges.",
        resource_type: "guide",
        category: "postpartum",
        author: "Dr. Anna Williams",
        tags: &["breastfeeding", "postpartum"],
        is_premium: false,
    },
    ResourceSeed {
        id: "res_008",
        title: "Understanding Baby Sleep Patterns",
        content: "Learn about newborn sleep cycles and safe sleep practices to help your baby (and you) get better rest.",
        resource_type: "article",
        category: "baby_milestones",
        author: "Dr. Michael Brown",
        tags: &["sleep", "baby"],
        is_premium: false,
    },
    ResourceSeed {
        id: "res_009",
        title: "Postpartum Mental Health",
        content: "Recognizing signs of postpartum depression and anxiety, plus resources for getting help.",
        resource_type: "article",
        category: "postpartum",
        author: "Dr. Rachel Green",
        tags: &["mental_health", "postpartum"],
        is_premium: false,
    },
    ResourceSeed {
        id: "res_010",
        title: "Baby-Led Weaning Guide",
        content: "Introduction to baby-led weaning, including when to start and safe first foods.",
        resource_type: "guide",
        category: "baby_milestones",
        author: "Dr. Patricia Davis",
        tags: &["feeding", "nutrition"],
        is_premium: false,
    },
    ResourceSeed {
        id: "res_011",
        title: "Prenatal Yoga Flow",
        content: "Premium video guide to prenatal yoga sequences for each trimester.",
        resource_type: "video",
        category: "pregnancy",
        author: "Instructor Maya Patel",
        tags: &["yoga", "exercise"],
        is_premium: true,
    },
    ResourceSeed {
        id: "res_012",
        title: "Cesarean Section: What to Expect",
        content: "Comprehensive guide to c-section procedures, recovery, and caring for your incision.",
        resource_type: "guide",
        category: "childbirth",
        author: "Dr. Jennifer Taylor",
        tags: &["c_section", "childbirth"],
        is_premium: false,
    },
    ResourceSeed {
        id: "res_013",
        title: "Twins and Multiples Care",
        content: "Special considerations and tips for expecting and caring for twins or multiples.",
        resource_type: "article",
        category: "pregnancy",
        author: "Dr. Kevin Anderson",
        tags: &["twins", "multiples"],
        is_premium: false,
    },
    ResourceSeed {
        id: "res_014",
        title: "Creating a Birth Plan",
        content: "Template and guidance for creating a personalized birth plan that reflects your preferences.",
        resource_type: "guide",
        category: "pregnancy",
        author: "Midwife Susan Clark",
        tags: &["birth_plan", "pregnancy"],
        is_premium: false,
    },
    ResourceSeed {
        id: "res_015",
        title: "Postpartum Nutrition & Recovery",
        content: "Nutritional needs after delivery to support healing and breastfeeding.",
        resource_type: "article",
        category: "postpartum",
        author: "Nutritionist Amy White",
        tags: &["nutrition", "recovery"],
        is_premium: false,
    },
    ResourceSeed {
        id: "res_016",
        title: "Baby Massage Techniques",
        content: "Premium video demonstration of infant massage to promote bonding and relaxation.",
        resource_type: "video",
        category: "baby_milestones",
        author: "Therapist Laura Martinez",
        tags: &["massage", "bonding"],
        is_premium: true,
    },
    ResourceSeed {
        id: "res_017",
        title: "Managing Morning Sickness",
        content: "Evidence-based strategies to cope with nausea and vomiting during pregnancy.",
        resource_type: "article",
        category: "pregnancy",
        author: "Dr. Sarah Johnson",
        tags: &["morning_sickness", "symptoms"],
        is_premium: false,
    },
    ResourceSeed {
        id: "res_018",
        title: "Perineal Care After Birth",
        content: "Guide to caring for your perineum after vaginal delivery, including pain management.",
        resource_type: "guide",
        category: "postpartum",
        author: "Dr. Maria Rodriguez",
        tags: &["recovery", "postpartum"],
        is_premium: false,
    },
    ResourceSeed {
        id: "res_019",
        title: "Baby's Language Development",
        content: "Milestones in speech and language from cooing to first words.",
        resource_type: "article",
        category: "baby_milestones",
        author: "Speech Therapist Diana Lee",
        tags: &["language", "development"],
        is_premium: false,
    },
    ResourceSeed {
        id: "res_020",
        title: "Advanced Labor Positions",
        content: "Premium guide to optimal labor positions for each stage of delivery.",
        resource_type: "guide",
        category: "childbirth",
        author: "Doula Christine Moore",
        tags: &["labor", "positions"],
        is_premium: true,
    },
];

const POSTS: &[PostSeed] = &[
    PostSeed {
        id: "post_sample_001",
        author_id: "sample_user_001",
        author_name: "Emma Thompson",
        title: "Just felt the first kicks at 20 weeks!",
        content: "I'm so excited! I was sitting at my desk today when I felt these little flutters. It took me a moment to realize it was the baby moving. Such an incredible feeling! Anyone else remember their first kicks?",
        category: "pregnancy",
        tags: &["kicks", "20_weeks", "exciting"],
        likes_count: 24,
        comments_count: 8,
    },
    PostSeed {
        id: "post_sample_002",
        author_id: "sample_user_002",
        author_name: "Sophia Martinez",
        title: "Birth story: Positive induction experience",
        content: "I wanted to share my positive induction story for anyone who might be nervous. I was induced at 39 weeks due to gestational diabetes. The whole process took about 12 hours, and while it was intense, having a supportive partner and amazing nurses made all the difference. My baby girl arrived healthy at 7lbs 3oz!",
        category: "childbirth",
        tags: &["birth_story", "induction", "positive"],
        likes_count: 45,
        comments_count: 15,
    },
    PostSeed {
        id: "post_sample_003",
        author_id: "sample_user_003",
        author_name: "Olivia Johnson",
        title: "4 weeks postpartum - recovery update",
        content: "Four weeks out and finally starting to feel more like myself! The first two weeks were really tough with lack of sleep and healing, but it does get better. To any new mamas out there - be patient with yourself, rest when you can, and don't hesitate to ask for help!",
        category: "postpartum",
        tags: &["recovery", "4_weeks", "postpartum"],
        likes_count: 32,
        comments_count: 11,
    },
    PostSeed {
        id: "post_sample_004",
        author_id: "sample_user_004",
        author_name: "Ava Davis",
        title: "Baby rolled over for the first time!",
        content: "At 4 months old, our little one just rolled from tummy to back during tummy time! I actually missed it the first time because I looked away for a second. So glad I caught it on the second try! These milestones are so special.",
        category: "baby_milestones",
        tags: &["rolling", "4_months", "milestone"],
        likes_count: 28,
        comments_count: 6,
    },
    PostSeed {
        id: "post_sample_005",
        author_id: "sample_user_005",
        author_name: "Isabella Wilson",
        title: "Dealing with morning sickness - what worked for me",
        content: "I'm 8 weeks pregnant and the morning sickness has been brutal. Here's what's been helping: eating small meals every 2 hours, ginger tea, staying hydrated, and keeping crackers by the bed. Vitamin B6 also helped after talking to my doctor. Hang in there, mamas!",
        category: "pregnancy",
        tags: &["morning_sickness", "first_trimester", "tips"],
        likes_count: 41,
        comments_count: 19,
    },
    PostSeed {
        id: "post_sample_006",
        author_id: "sample_user_006",
        author_name: "Mia Brown",
        title: "Breastfeeding journey - 6 months strong!",
        content: "Just hit 6 months of breastfeeding! It wasn't easy at first - we had latch issues and I almost gave up. But with support from a lactation consultant and this amazing community, we pushed through. To anyone struggling: you've got this, and fed is best no matter what you choose!",
        category: "postpartum",
        tags: &["breastfeeding", "6_months", "support"],
        likes_count: 56,
        comments_count: 22,
    },
    PostSeed {
        id: "post_sample_007",
        author_id: "sample_user_007",
        author_name: "Charlotte Garcia",
        title: "Baby said 'mama' today!",
        content: "I know it was probably just babbling, but my 7-month-old clearly said 'mama' while looking right at me! My heart melted. These little moments make all the sleepless nights worth it.",
        category: "baby_milestones",
        tags: &["first_words", "7_months", "mama"],
        likes_count: 67,
        comments_count: 14,
    },
    PostSeed {
        id: "post_sample_008",
        author_id: "sample_user_008",
        author_name: "Amelia Rodriguez",
        title: "Tips for surviving the third trimester",
        content: "35 weeks and feeling every bit of it! Here are my survival tips: pregnancy pillow is a MUST, staying hydrated, gentle stretches, and not feeling guilty about taking naps. Also, preparing freezer meals has been a game changer for postpartum prep.",
        category: "pregnancy",
        tags: &["third_trimester", "tips", "35_weeks"],
        likes_count: 39,
        comments_count: 17,
    },
    PostSeed {
        id: "post_sample_009",
        author_id: "sample_user_009",
        author_name: "Harper Lee",
        title: "C-section recovery - one month update",
        content: "Had an unplanned c-section and wanted to share my recovery journey. The first week was tough, but following doctor's orders and taking it slow really helped. Incision is healing well, and I'm finally able to move around more comfortably. Remember to be gentle with yourself!",
        category: "postpartum",
        tags: &["c_section", "recovery", "1_month"],
        likes_count: 44,
        comments_count: 13,
    },
    PostSeed {
        id: "post_sample_010",
        author_id: "sample_user_010",
        author_name: "Evelyn Martinez",
        title: "Baby started crawling at 8 months!",
        content: "We've officially entered the mobile phase! Baby started crawling yesterday and hasn't stopped exploring. Time to baby-proof everything! Any tips on keeping curious crawlers safe?",
        category: "baby_milestones",
        tags: &["crawling", "8_months", "mobility"],
        likes_count: 35,
        comments_count: 9,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{forums, posts, resources};
    use crate::db;

    #[test]
    fn load_is_idempotent() {
        let pool = db::test_pool();
        let mut conn = pool.get().unwrap();

        let first = load(&mut conn).unwrap();
        assert_eq!(
            first,
            SeedReport {
                forums: 12,
                groups: 8,
                resources: 20,
                users: 10,
                posts: 10,
            }
        );

        let second = load(&mut conn).unwrap();
        assert_eq!(second, SeedReport::default());
    }

    #[test]
    fn seeded_rows_decode_through_the_stores() {
        let pool = db::test_pool();
        let mut conn = pool.get().unwrap();
        load(&mut conn).unwrap();

        assert_eq!(forums::list_forums(&conn).unwrap().len(), 12);
        assert_eq!(forums::list_groups(&conn).unwrap().len(), 8);
        assert_eq!(posts::list(&conn, None, 100, 0).unwrap().len(), 10);

        let everything = resources::list(&conn, None, true).unwrap();
        assert_eq!(everything.len(), 20);
        let mut premium: Vec<_> = everything
            .iter()
            .filter(|r| r.is_premium)
            .map(|r| r.id.as_str())
            .collect();
        premium.sort();
        assert_eq!(premium, vec!["res_005", "res_011", "res_016", "res_020"]);
    }

    #[test]
    fn seeded_post_counters_survive_a_like_toggle() {
        let pool = db::test_pool();
        let mut conn = pool.get().unwrap();
        load(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO users (id, email, name, created_at) VALUES ('user_fan', 'fan@example.com', 'Fan', ?1)",
            params![format_time(&Utc::now())],
        )
        .unwrap();

        let liked = posts::toggle_like(&mut conn, "post_sample_001", "user_fan").unwrap();
        assert_eq!(liked.likes_count, 25);
        let unliked = posts::toggle_like(&mut conn, "post_sample_001", "user_fan").unwrap();
        assert_eq!(unliked.likes_count, 24);
    }
}
