//! Built-in Apache Camel migration data

use super::{CatalogueError, Version};
use crate::action::{Action, ArgRef};
use crate::pattern::{MethodPattern, Pattern, TypeAliases};
use crate::recipe::{Recipe, RewriteRule};
use crate::tree::ArtifactKind;

fn version(major: u32, minor: u32) -> Version {
    Version::new(major, minor, 0)
}

const ROUTE_CONTROL: &[&str] = &[
    "startRoute",
    "stopRoute",
    "suspendRoute",
    "resumeRoute",
    "getRouteStatus",
];

const ENDPOINT_ANNOTATIONS: &[&str] = &[
    "org.apache.camel.Consume",
    "org.apache.camel.Produce",
    "org.apache.camel.EndpointInject",
];

const TYPES_30: &[(&str, &str)] = &[
    ("org.apache.camel.impl.SimpleRegistry", "org.apache.camel.support.SimpleRegistry"),
    ("org.apache.camel.impl.JndiRegistry", "org.apache.camel.support.jndi.JndiBeanRepository"),
    ("org.apache.camel.impl.DefaultExchange", "org.apache.camel.support.DefaultExchange"),
    ("org.apache.camel.impl.DefaultMessage", "org.apache.camel.support.DefaultMessage"),
    ("org.apache.camel.impl.DefaultComponent", "org.apache.camel.support.DefaultComponent"),
    ("org.apache.camel.impl.DefaultEndpoint", "org.apache.camel.support.DefaultEndpoint"),
    ("org.apache.camel.impl.DefaultProducer", "org.apache.camel.support.DefaultProducer"),
    ("org.apache.camel.impl.DefaultAsyncProducer", "org.apache.camel.support.DefaultAsyncProducer"),
    ("org.apache.camel.impl.DefaultConsumer", "org.apache.camel.support.DefaultConsumer"),
    ("org.apache.camel.impl.ScheduledPollConsumer", "org.apache.camel.support.ScheduledPollConsumer"),
    ("org.apache.camel.impl.ScheduledPollEndpoint", "org.apache.camel.support.ScheduledPollEndpoint"),
    ("org.apache.camel.util.ExchangeHelper", "org.apache.camel.support.ExchangeHelper"),
    ("org.apache.camel.util.MessageHelper", "org.apache.camel.support.MessageHelper"),
    ("org.apache.camel.util.EndpointHelper", "org.apache.camel.support.EndpointHelper"),
    ("org.apache.camel.util.IntrospectionSupport", "org.apache.camel.support.IntrospectionSupport"),
    ("org.apache.camel.util.ServiceHelper", "org.apache.camel.support.service.ServiceHelper"),
    ("org.apache.camel.support.ServiceSupport", "org.apache.camel.support.service.ServiceSupport"),
    ("org.apache.camel.component.http4.HttpComponent", "org.apache.camel.component.http.HttpComponent"),
    ("org.apache.camel.component.mongodb3.MongoDbComponent", "org.apache.camel.component.mongodb.MongoDbComponent"),
    ("org.apache.camel.component.netty4.NettyComponent", "org.apache.camel.component.netty.NettyComponent"),
    ("org.apache.camel.component.quartz2.QuartzComponent", "org.apache.camel.component.quartz.QuartzComponent"),
];

const PACKAGES_30: &[(&str, &str)] = &[
    ("org.apache.camel.component.http4", "org.apache.camel.component.http"),
    ("org.apache.camel.component.mongodb3", "org.apache.camel.component.mongodb"),
    ("org.apache.camel.component.netty4", "org.apache.camel.component.netty"),
    ("org.apache.camel.component.quartz2", "org.apache.camel.component.quartz"),
];

const TYPES_31: &[(&str, &str)] = &[
    (
        "org.apache.camel.http.common.HttpOperationFailedException",
        "org.apache.camel.http.base.HttpOperationFailedException",
    ),
    (
        "org.apache.camel.http.common.cookie.CookieHandler",
        "org.apache.camel.http.base.cookie.CookieHandler",
    ),
    (
        "org.apache.camel.http.common.cookie.BaseCookieHandler",
        "org.apache.camel.http.base.cookie.BaseCookieHandler",
    ),
    (
        "org.apache.camel.http.common.cookie.ExchangeCookieHandler",
        "org.apache.camel.http.base.cookie.ExchangeCookieHandler",
    ),
    (
        "org.apache.camel.http.common.cookie.InstanceCookieHandler",
        "org.apache.camel.http.base.cookie.InstanceCookieHandler",
    ),
    (
        "org.apache.camel.processor.validation.PredicateValidatingProcessor",
        "org.apache.camel.support.processor.PredicateValidatingProcessor",
    ),
];

/// Exchange properties that became dedicated setters in 3.1
const EXCHANGE_FLAGS_31: &[(&str, &str)] = &[
    ("ROUTE_STOP", "setRouteStop"),
    ("ROLLBACK_ONLY", "setRollbackOnly"),
    ("ROLLBACK_ONLY_LAST", "setRollbackOnlyLast"),
];

const REMOVED_CONSTANTS_31: &[(&str, &str)] = &[
    ("ERRORHANDLER_HANDLED", "use ExtendedExchange.isErrorHandlerHandled() instead"),
    ("CREATED_TIMESTAMP", "use Exchange.getCreated() instead"),
];

const REST_CONFIGURATION_32: &[&str] = &[
    "org.apache.camel.CamelContext addRestConfiguration(org.apache.camel.model.rest.RestConfiguration)",
    "org.apache.camel.CamelContext getRestConfiguration(java.lang.String, boolean)",
    "org.apache.camel.CamelContext getRestConfigurations()",
];

const REST_CONFIGURATION_NOTE: &str = "FIXME: Rest Configuration API changed in Camel 3.2. \
     Use CamelContext.getRestConfiguration() instead. \
     See https://camel.apache.org/manual/camel-3x-upgrade-guide-3_2.html#_rest_configuration";

/// `BaseMainSupport` members moved to `MainConfigurationProperties` in 3.3
const MAIN_RELOCATED_33: &[&str] = &[
    "getConfigurationClasses()",
    "setConfigurationClasses(*)",
    "addConfigurationClass(*)",
    "addConfiguration(*)",
    "getConfigurations()",
    "setConfigurations(*)",
    "getRouteBuilderClasses()",
    "setRouteBuilderClasses(*)",
    "getRouteBuilders()",
    "getRoutesBuilders()",
    "setRoutesBuilders(*)",
    "addRoutesBuilder(*)",
];

const MAIN_TYPES_33: &[&str] = &["org.apache.camel.main.BaseMainSupport", "org.apache.camel.main.Main"];

const REMOVED_REJECTED_POLICIES_40: &[&str] = &["DiscardOldest", "Discard"];

const COMPONENTS_RENAMED_30: &[(&str, &str)] = &[("camel-aws", "camel-aws-s3")];

const COMPONENTS_REMOVED_30: &[&str] = &["camel-jibx", "camel-linkedin"];

/// Dropped from the Karaf feature set in 3.3
const COMPONENTS_REMOVED_33: &[&str] = &["camel-undertow", "camel-jgroups", "camel-jgroups-raft"];

const TYPES_418: &[(&str, &str)] = &[
    (
        "org.apache.camel.component.qdrant.Qdrant.Headers",
        "org.apache.camel.component.qdrant.QdrantHeaders",
    ),
    (
        "org.eclipse.tahu.host.api.HostApplicationEventHandler",
        "org.eclipse.tahu.host.api.MultiHostApplicationEventHandler",
    ),
    (
        "org.apache.camel.component.tahu.handlers.TahuHostApplicationEventHandler",
        "org.apache.camel.component.tahu.handlers.MultiTahuHostApplicationEventHandler",
    ),
];

/// Every built-in recipe
pub fn recipes() -> Result<Vec<Recipe>, CatalogueError> {
    Ok(vec![
        java_api_30()?,
        relocations("camel-3.0-java-types", version(2, 0), version(3, 0), TYPES_30)
            .with_display_name("Camel 3.0 type relocations")
            .with_description("Classes moved out of impl and util into support, and renamed components."),
        xml_dsl_30()?,
        pom_30()?,
        java_api_31()?,
        relocations("camel-3.1-java-types", version(3, 0), version(3, 1), TYPES_31)
            .with_display_name("Camel 3.1 package changes"),
        java_api_32()?,
        xml_dsl_32()?,
        java_api_33()?,
        pom_33()?,
        properties_40()?,
        relocations("camel-4.18-java-types", version(4, 17), version(4, 18), TYPES_418)
            .with_display_name("Camel 4.18 type renames")
            .with_description("camel-qdrant headers class and camel-tahu event handlers."),
    ])
}

/// Package relocations without a per-type rule
pub fn aliases() -> Vec<(Version, Version, TypeAliases)> {
    let mut camel_30 = TypeAliases::new();
    for (old, new) in PACKAGES_30 {
        camel_30.add_package(old, new);
    }
    let mut camel_31 = TypeAliases::new();
    camel_31.add_package(
        "org.apache.camel.http.common.cookie",
        "org.apache.camel.http.base.cookie",
    );
    vec![
        (version(2, 0), version(3, 0), camel_30),
        (version(3, 0), version(3, 1), camel_31),
    ]
}

fn relocations(id: &str, from: Version, to: Version, types: &[(&str, &str)]) -> Recipe {
    types.iter().fold(
        Recipe::new(id, from, to, ArtifactKind::Code),
        |recipe, (old, new)| {
            let simple = old.rsplit('.').next().unwrap_or(old);
            recipe.with_rule(RewriteRule::new(
                &format!("{}-{}", id, simple),
                Pattern::type_ref(old),
                Action::rename(new),
            ))
        },
    )
}

fn java_api_30() -> Result<Recipe, CatalogueError> {
    let mut recipe = Recipe::new("camel-3.0-java-api", version(2, 0), version(3, 0), ArtifactKind::Code)
        .with_display_name("Camel API changes for Camel 3.0")
        .with_description(
            "Apache Camel API migration from version 2.x to 3.0. Removal of deprecated APIs and package changes.",
        )
        .with_rule(
            RewriteRule::new(
                "context-get-properties",
                Pattern::signature("org.apache.camel.CamelContext getProperties()")?,
                Action::rename("getGlobalOptions"),
            )
            .with_description("CamelContext.getProperties() is now getGlobalOptions()"),
        )
        .with_rule(
            RewriteRule::new(
                "registry-put",
                Pattern::Any(vec![
                    Pattern::signature("org.apache.camel.spi.Registry put(java.lang.String, *)")?,
                    Pattern::signature("org.apache.camel.impl.SimpleRegistry put(java.lang.String, *)")?,
                ]),
                Action::rename("bind"),
            )
            .with_description("Registry.put() is now bind()"),
        );

    for method in ROUTE_CONTROL {
        recipe = recipe.with_rule(
            RewriteRule::new(
                &format!("context-{}", method),
                Pattern::signature(&format!(
                    "org.apache.camel.CamelContext {}(java.lang.String, ..)",
                    method
                ))?,
                Action::wrap_with_accessor("getRouteController"),
            )
            .with_description(&format!("CamelContext.{}() moved to the RouteController", method)),
        );
    }

    for annotation in ENDPOINT_ANNOTATIONS {
        let simple = annotation.rsplit('.').next().unwrap_or(annotation);
        recipe = recipe.with_rule(RewriteRule::new(
            &format!("{}-ref", simple.to_lowercase()),
            Pattern::annotation(annotation, Some("ref")),
            Action::annotate(&format!(
                "FIXME: @{} no longer supports ref, use uri = \"ref:beanName\" instead",
                simple
            )),
        ));
    }
    Ok(recipe)
}

fn xml_dsl_30() -> Result<Recipe, CatalogueError> {
    Ok(
        Recipe::new("camel-3.0-xml-dsl", version(2, 0), version(3, 0), ArtifactKind::Markup)
            .with_display_name("Camel XML DSL changes for 3.0")
            .with_description("Apache Camel XML DSL migration from version 2.x to 3.0.")
            .with_rule(RewriteRule::new(
                "custom-load-balancer",
                Pattern::path("loadBalance/custom")?,
                Action::rename("customLoadBalancer"),
            ))
            .with_rule(RewriteRule::new(
                "aggregate-completion-size",
                Pattern::path("aggregate/completionSize")?,
                Action::rename("completionSizeExpression"),
            ))
            .with_rule(RewriteRule::new(
                "aggregate-completion-timeout",
                Pattern::path("aggregate/completionTimeout")?,
                Action::rename("completionTimeoutExpression"),
            ))
            .with_rule(RewriteRule::new(
                "hystrix",
                Pattern::path("hystrix")?,
                Action::rename("circuitBreaker"),
            ))
            .with_rule(RewriteRule::new(
                "set-header-name",
                Pattern::path("setHeader")?,
                Action::rename_attribute("headerName", "name"),
            ))
            .with_rule(RewriteRule::new(
                "set-property-name",
                Pattern::path("setProperty")?,
                Action::rename_attribute("propertyName", "name"),
            )),
    )
}

/// `pom.xml` dependencies on a Camel component
fn component_dependency(artifact: &str) -> String {
    format!(
        "/project//dependency[groupId='org.apache.camel'][artifactId='{}']",
        artifact
    )
}

fn remove_components(mut recipe: Recipe, components: &[&str]) -> Result<Recipe, CatalogueError> {
    for component in components {
        recipe = recipe.with_rule(
            RewriteRule::new(
                &format!("remove-{}", component),
                Pattern::path(&component_dependency(component))?,
                Action::remove(),
            )
            .with_description(&format!("{} no longer exists", component)),
        );
    }
    Ok(recipe)
}

fn pom_30() -> Result<Recipe, CatalogueError> {
    let mut recipe = Recipe::new("camel-3.0-pom", version(2, 0), version(3, 0), ArtifactKind::Markup)
        .with_display_name("Camel 3.0 component dependencies")
        .with_description("Renamed and removed components in Maven build descriptors.");
    for (old, new) in COMPONENTS_RENAMED_30 {
        recipe = recipe.with_rule(
            RewriteRule::new(
                &format!("rename-{}", old),
                Pattern::path(&format!(
                    "/project//dependency[groupId='org.apache.camel']/artifactId[.='{}']",
                    old
                ))?,
                Action::change_value(new),
            )
            .with_description(&format!("{} is now {}", old, new)),
        );
    }
    remove_components(recipe, COMPONENTS_REMOVED_30)
}

fn pom_33() -> Result<Recipe, CatalogueError> {
    let recipe = Recipe::new("camel-3.3-pom", version(3, 2), version(3, 3), ArtifactKind::Markup)
        .with_display_name("Camel 3.3 component dependencies")
        .with_description("Components removed with the Karaf feature cleanup.");
    remove_components(recipe, COMPONENTS_REMOVED_33)
}

fn java_api_31() -> Result<Recipe, CatalogueError> {
    let mut recipe = Recipe::new("camel-3.1-java-api", version(3, 0), version(3, 1), ArtifactKind::Code)
        .with_display_name("Camel API changes for Camel 3.1")
        .with_description(
            "Apache Camel API migration from version 3.0 to 3.1. \
             Migrates Exchange property-based API calls to dedicated method calls.",
        );

    for (constant, setter) in EXCHANGE_FLAGS_31 {
        let signature = "org.apache.camel.Exchange setProperty(*, *)"
            .parse::<MethodPattern>()?
            .with_constant(0, &format!("org.apache.camel.Exchange.{}", constant));
        recipe = recipe.with_rule(
            RewriteRule::new(
                &format!("exchange-{}", constant.to_lowercase().replace('_', "-")),
                Pattern::Signature(signature),
                Action::retarget(
                    &format!("#{{any(org.apache.camel.Exchange)}}.{}(#{{any()}})", setter),
                    vec![ArgRef::Receiver, ArgRef::Arg(1)],
                )?,
            )
            .with_description(&format!("Exchange.{} is now Exchange.{}()", constant, setter)),
        );
    }

    for (constant, advice) in REMOVED_CONSTANTS_31 {
        recipe = recipe.with_rule(RewriteRule::new(
            &format!("exchange-{}", constant.to_lowercase().replace('_', "-")),
            Pattern::type_ref(&format!("org.apache.camel.Exchange.{}", constant)),
            Action::notice(&format!("Exchange.{} was removed, {}", constant, advice)),
        ));
    }
    Ok(recipe)
}

fn java_api_32() -> Result<Recipe, CatalogueError> {
    let alternatives = REST_CONFIGURATION_32
        .iter()
        .map(|s| Pattern::initializer(s))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(
        Recipe::new("camel-3.2-java-api", version(3, 1), version(3, 2), ArtifactKind::Code)
            .with_display_name("Camel Java API changes for Camel 3.2")
            .with_description(
                "Apache Camel Java API migration from version 3.1 to 3.2. \
                 Flags Rest Configuration API changes.",
            )
            .with_rule(RewriteRule::new(
                "rest-configuration",
                Pattern::Any(alternatives),
                Action::annotate(REST_CONFIGURATION_NOTE),
            )),
    )
}

fn xml_dsl_32() -> Result<Recipe, CatalogueError> {
    let mut recipe = Recipe::new("camel-3.2-xml-dsl", version(3, 1), version(3, 2), ArtifactKind::Markup)
        .with_display_name("Camel XML DSL changes for 3.2")
        .with_description(
            "Apache Camel XML DSL migration from version 3.1 to 3.2. \
             Flags nested configuration in any23 and xstream data formats.",
        );
    for format in ["any23", "xstream"] {
        recipe = recipe.with_rule(RewriteRule::new(
            &format!("{}-nested-configuration", format),
            Pattern::path(&format!("{}/*", format))?,
            Action::annotate(&format!(
                "FIXME: nested {} configuration was flattened into attributes in Camel 3.2",
                format
            )),
        ));
    }
    Ok(recipe)
}

fn java_api_33() -> Result<Recipe, CatalogueError> {
    let mut recipe = Recipe::new("camel-3.3-java-api", version(3, 2), version(3, 3), ArtifactKind::Code)
        .with_display_name("Camel Java API changes for Camel 3.3")
        .with_description(
            "Apache Camel Java API migration from version 3.2 to 3.3. \
             Handles camel-main API relocation from BaseMainSupport to MainConfigurationProperties.",
        );
    for member in MAIN_RELOCATED_33 {
        let name = member.split('(').next().unwrap_or(member);
        let owners = MAIN_TYPES_33
            .iter()
            .map(|owner| Pattern::signature(&format!("{} {}", owner, member)))
            .collect::<Result<Vec<_>, _>>()?;
        recipe = recipe.with_rule(
            RewriteRule::new(
                &format!("main-{}", name),
                Pattern::Any(owners),
                Action::wrap_with_accessor("configure"),
            )
            .with_description(&format!("{}() moved to MainConfigurationProperties", name)),
        );
    }
    Ok(recipe)
}

fn properties_40() -> Result<Recipe, CatalogueError> {
    let mut recipe = Recipe::new("camel-4.0-properties", version(3, 22), version(4, 0), ArtifactKind::Properties)
        .with_display_name("Camel 4.0 property changes")
        .with_description("Thread pool rejected policies removed in Camel 4.0.");
    for policy in REMOVED_REJECTED_POLICIES_40 {
        recipe = recipe.with_rule(RewriteRule::new(
            &format!("rejected-policy-{}", policy.to_lowercase()),
            Pattern::property("camel.threadpool*.rejectedPolicy", Some(policy))?,
            Action::change_value(&format!("Abort #{} has been removed, consider Abort", policy)),
        ));
    }
    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::Catalogue;
    use crate::lang::{JavaLanguage, Language, PropertiesLanguage, XmlLanguage};
    use crate::tree::Tree;
    use pretty_assertions::assert_eq;

    fn migrate(from: &str, to: &str, tree: Tree) -> String {
        let plan = Catalogue::builtin()
            .unwrap()
            .resolve(from.parse().unwrap(), to.parse().unwrap())
            .unwrap();
        plan.recipes_for(tree.kind())
            .fold(tree, |tree, recipe| recipe.run(&tree, &plan.aliases).tree)
            .unparse()
    }

    #[test]
    fn test_rule_ids_are_unique() {
        for recipe in recipes().unwrap() {
            let mut ids: Vec<&str> = recipe.rules.iter().map(|r| r.id.as_str()).collect();
            let total = ids.len();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), total, "{}", recipe.id);
        }
    }

    #[test]
    fn test_registry_and_relocation() {
        let source = r#"import org.apache.camel.impl.SimpleRegistry;

public class TestRoute {
    public void configure() {
        SimpleRegistry registry = new SimpleRegistry();
        registry.put("myBean", new Object());
    }
}
"#;
        let tree = JavaLanguage::new().parse(source).unwrap();
        assert_eq!(
            migrate("2", "3.0", tree),
            source
                .replace("camel.impl.SimpleRegistry", "camel.support.SimpleRegistry")
                .replace("registry.put", "registry.bind")
        );
    }

    #[test]
    fn test_exchange_constants_by_identity() {
        let source = r#"import org.apache.camel.Exchange;

public class TestProcessor {
    public void process(Exchange exchange) {
        exchange.setProperty(Exchange.ROLLBACK_ONLY_LAST, Boolean.TRUE);
        exchange.setProperty("Exchange.ROUTE_STOP", Boolean.TRUE);
    }
}
"#;
        let tree = JavaLanguage::new().parse(source).unwrap();
        assert_eq!(
            migrate("3.0", "3.1", tree),
            source.replace(
                "exchange.setProperty(Exchange.ROLLBACK_ONLY_LAST, Boolean.TRUE)",
                "exchange.setRollbackOnlyLast(Boolean.TRUE)"
            )
        );
    }

    #[test]
    fn test_main_configure_accessor() {
        let source = "import org.apache.camel.main.Main;\nclass App {\n  void run(Main main) {\n    main.addRoutesBuilder(new MyRoutes());\n  }\n}\n";
        let tree = JavaLanguage::new().parse(source).unwrap();
        assert_eq!(
            migrate("3.2", "3.3", tree),
            source.replace("main.addRoutesBuilder", "main.configure().addRoutesBuilder")
        );
    }

    #[test]
    fn test_xml_dsl() {
        let source = "<route>\n  <hystrix/>\n  <setProperty propertyName=\"p\"><constant>x</constant></setProperty>\n</route>\n";
        let tree = XmlLanguage::new().parse(source).unwrap();
        assert_eq!(
            migrate("2", "3.0", tree),
            "<route>\n  <circuitBreaker/>\n  <setProperty name=\"p\"><constant>x</constant></setProperty>\n</route>\n"
        );
    }

    const POM: &str = r#"<project>
    <modelVersion>4.0.0</modelVersion>
    <dependencies>
        <dependency>
            <groupId>org.apache.camel</groupId>
            <artifactId>camel-jibx</artifactId>
            <version>2.25.0</version>
        </dependency>
        <dependency>
            <groupId>org.apache.camel</groupId>
            <artifactId>camel-aws</artifactId>
            <version>2.25.0</version>
        </dependency>
        <dependency>
            <groupId>com.acme</groupId>
            <artifactId>camel-linkedin</artifactId>
        </dependency>
    </dependencies>
</project>
"#;

    #[test]
    fn test_pom_component_changes() {
        let tree = XmlLanguage::new().parse(POM).unwrap();
        let migrated = migrate("2", "3.0", tree);
        assert_eq!(
            migrated,
            r#"<project>
    <modelVersion>4.0.0</modelVersion>
    <dependencies>
        <dependency>
            <groupId>org.apache.camel</groupId>
            <artifactId>camel-aws-s3</artifactId>
            <version>2.25.0</version>
        </dependency>
        <dependency>
            <groupId>com.acme</groupId>
            <artifactId>camel-linkedin</artifactId>
        </dependency>
    </dependencies>
</project>
"#
        );

        let again = XmlLanguage::new().parse(&migrated).unwrap();
        assert_eq!(migrate("2", "3.0", again), migrated);
    }

    #[test]
    fn test_pom_karaf_removals() {
        let source = "<project>\n    <dependencies>\n        <dependency>\n            <groupId>org.apache.camel</groupId>\n            <artifactId>camel-jgroups-raft</artifactId>\n        </dependency>\n    </dependencies>\n</project>\n";
        let tree = XmlLanguage::new().parse(source).unwrap();
        assert_eq!(
            migrate("3.2", "3.3", tree),
            "<project>\n    <dependencies>\n    </dependencies>\n</project>\n"
        );
    }

    #[test]
    fn test_rejected_policy() {
        let source = "#test\ncamel.threadpool.rejectedPolicy=DiscardOldest\ncamel.threadpool.poolSize=5\n";
        let tree = PropertiesLanguage::new().parse(source).unwrap();
        assert_eq!(
            migrate("3.22", "4.0", tree),
            "#test\ncamel.threadpool.rejectedPolicy=Abort #DiscardOldest has been removed, consider Abort\ncamel.threadpool.poolSize=5\n"
        );
    }

    #[test]
    fn test_qdrant_headers() {
        let source = "import org.apache.camel.component.qdrant.Qdrant.Headers;\n\npublic class QdrantTest {\n    public void test()  {\n        Headers headers = null;\n    }\n}\n";
        let tree = JavaLanguage::new().parse(source).unwrap();
        assert_eq!(
            migrate("4.17", "4.18", tree),
            "import org.apache.camel.component.qdrant.QdrantHeaders;\n\npublic class QdrantTest {\n    public void test()  {\n        QdrantHeaders headers = null;\n    }\n}\n"
        );
    }
}
