//! Synthetic Java source snippets for the scenario fixtures: a Feign client/
//! consumer pair, a Dubbo service/reference pair, and a plain in-repo
//! class pair for the main-repo-exclusion case.

/// `pay-api`'s Feign client interface before `batchUpdatePoints` is added.
pub fn feign_client_v1() -> String {
    r#"package com.cloudE.pay.client;

import org.springframework.cloud.openfeign.FeignClient;

@FeignClient(name = "pay-provider")
public interface PointClient {

    @PostMapping("/points/add")
    void addPoints(Long userId, Long points);
}
"#
    .to_string()
}

/// Same file with `batchUpdatePoints` added — the changed method.
pub fn feign_client_v2() -> String {
    r#"package com.cloudE.pay.client;

import org.springframework.cloud.openfeign.FeignClient;

@FeignClient(name = "pay-provider")
public interface PointClient {

    @PostMapping("/points/add")
    void addPoints(Long userId, Long points);

    @PostMapping("/points/batch")
    void batchUpdatePoints(java.util.List<Long> userIds, java.util.List<Long> points);
}
"#
    .to_string()
}

/// `ucenter-provider`'s consumer: field-injects `PointClient` and calls the
/// new method from three sites. The call sites reference the lowercase
/// `pointClient` variable rather than the `PointClient` type token, so only
/// the field declaration is detectable without real type inference.
pub fn point_manager_consumer() -> String {
    r#"package com.example.ucenter;

import com.cloudE.pay.client.PointClient;
import javax.annotation.Resource;

public class PointManager {

    @Resource
    private PointClient pointClient;

    public void syncOnCreate(Long userId, Long points) {
        pointClient.batchUpdatePoints(java.util.List.of(userId), java.util.List.of(points));
    }

    public void syncOnRefund(Long userId, Long points) {
        pointClient.batchUpdatePoints(java.util.List.of(userId), java.util.List.of(points));
    }

    public void syncOnExpiry(Long userId, Long points) {
        pointClient.batchUpdatePoints(java.util.List.of(userId), java.util.List.of(points));
    }
}
"#
    .to_string()
}

/// Main repo's Dubbo-annotated service before `getUserById` changes.
///
/// The heuristic indexer has no interface/implementation resolution, so the
/// class that carries `@DubboService` is also the type consumers reference
/// directly (no separate `UserService` interface file).
pub fn dubbo_service_v1() -> String {
    r#"package com.example.service;

@DubboService
public class UserService {

    public User getUserById(Long id) {
        return repository.findOne(id);
    }
}
"#
    .to_string()
}

/// Same file with `getUserById`'s body changed.
pub fn dubbo_service_v2() -> String {
    r#"package com.example.service;

@DubboService
public class UserService {

    public User getUserById(Long id) {
        User cached = cache.get(id);
        if (cached != null) {
            return cached;
        }
        return repository.findOne(id);
    }
}
"#
    .to_string()
}

/// Related repo's Dubbo consumer: field-injects `UserService` and calls it.
pub fn user_facade_with_dubbo_reference() -> String {
    r#"package com.example.consumer;

import com.example.service.UserService;

public class UserFacade {

    @DubboReference
    private UserService remoteService;

    public User lookup(Long id) {
        return remoteService.getUserById(id);
    }
}
"#
    .to_string()
}

/// Main repo's own changed file, for the main-repo-exclusion scenario.
pub fn foo_v1() -> String {
    "package com.example.core;\n\npublic class Foo {\n\n    public void run() {\n    }\n}\n".to_string()
}

pub fn foo_v2() -> String {
    "package com.example.core;\n\npublic class Foo {\n\n    public void run() {\n        System.out.println(\"v2\");\n    }\n}\n".to_string()
}

/// A second, unrelated file in the *same* main repo that references `Foo` by
/// type token — the in-repo downstream dependency case.
pub fn bar_referencing_foo() -> String {
    r#"package com.example.core;

public class Bar {

    private Foo foo;

    public void use() {
        foo.run();
    }
}
"#
    .to_string()
}

/// A trivial, self-contained class for repos that only need to exist and be
/// cloneable (branch-fallback and partial-failure scenarios).
pub fn placeholder_class(package: &str, class_name: &str) -> String {
    format!("package {package};\n\npublic class {class_name} {{\n}}\n")
}
